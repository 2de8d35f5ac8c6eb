use shedding_data::model::ValueType;

/// Error returned when an analysis has no usable input.
///
/// Per-item problems (a participant without positive results, a sparse time
/// bin) are skipped silently. These errors are raised only when nothing is
/// left to compute on.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum AnalysisError {
    #[display("dataset has no participants")]
    MissingParticipants,
    #[display("no valid measurements found after filtering")]
    NoMeasurements,
    #[display("no measurements found for biomarker '{_0}'")]
    NoMatchingBiomarker(#[error(not(source))] String),
    #[display("no measurements found for specimen '{_0}'")]
    NoMatchingSpecimen(#[error(not(source))] String),
    #[display("no {_0} data found after filtering")]
    NoMatchingValueType(#[error(not(source))] ValueType),
    #[display("no measurements found in time range [{min}, {max}]")]
    NoMeasurementsInRange { min: f64, max: f64 },
    #[display(
        "dataset contains mixed CT values and concentrations; filter by value type 'concentration' or 'ct'"
    )]
    MixedValueTypes,
    #[display(
        "no time bins have at least {min_observations} observations; \
         reduce the minimum or use a larger bin size"
    )]
    InsufficientObservations { min_observations: usize },
    #[display("no participants with positive measurements found")]
    NoPositiveParticipants,
    #[display("dataset list cannot be empty")]
    EmptyDatasetList,
    #[display("time bin size must be a positive number, got {_0}")]
    InvalidBinSize(#[error(not(source))] f64),
    #[display("time range [{min}, {max}] spans too many bins of size {bin_size}")]
    TooManyBins { min: f64, max: f64, bin_size: f64 },
}
