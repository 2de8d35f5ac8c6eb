//! Side-by-side comparison of datasets
//!
//! Each dataset is reduced to one [`ComparisonRow`] built from its
//! per-participant [`SheddingSummary`] records and, when most participants
//! cleared, its Kaplan-Meier median clearance time.
//!
//! A dataset that cannot be analyzed under the filter does not abort the
//! comparison. It still gets a row, with zero participants and every statistic
//! left empty.
//!
//! Pooling heterogeneous data is allowed but reported through
//! [`ComparisonWarning`]s. Peak values are withheld entirely when cycle
//! thresholds and concentrations would be mixed, since their medians are
//! meaningless.

use std::collections::BTreeSet;

use serde::Serialize;
use shedding_data::model::{Dataset, ValueType};
use shedding_stats::summary::QuartileSummary;

use crate::{
    clearance::ClearanceSummary,
    error::AnalysisError,
    measurement::MeasurementFilter,
    summary::{ClearanceStatus, SheddingSummary},
};

/// Heterogeneous data pooled into one comparison without a filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, derive_more::Display)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComparisonWarning {
    #[display(
        "multiple biomarkers found ({}) but no biomarker filter specified; results merge data from all biomarkers",
        biomarkers.join(", ")
    )]
    MultipleBiomarkers { biomarkers: Vec<String> },
    #[display(
        "multiple specimens found ({}) but no specimen filter specified; results merge data from all specimens",
        specimens.join(", ")
    )]
    MultipleSpecimens { specimens: Vec<String> },
    #[display(
        "both concentration and CT value types found but no value type filter specified; \
         peak value statistics are excluded"
    )]
    MixedValueTypes,
}

/// Key statistics of one dataset.
///
/// Only participants with at least one positive measurement are counted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub dataset_id: String,
    pub n_participants: usize,
    pub n_measurements: Option<usize>,
    /// Percentage of positive measurements, rounded to one decimal.
    pub pct_positive: Option<f64>,
    pub median_shedding_duration: Option<f64>,
    /// `"q25-q75"` of shedding durations with one decimal.
    pub iqr_shedding_duration: Option<String>,
    pub median_peak_value: Option<f64>,
    /// `"q25-q75"` of peak values in scientific notation.
    pub iqr_peak_value: Option<String>,
    pub median_peak_time: Option<f64>,
    /// Percentage of participants who cleared, rounded to one decimal.
    pub pct_cleared: Option<f64>,
    /// Kaplan-Meier median, reported only if at least half cleared.
    pub median_clearance_time: Option<f64>,
}

impl ComparisonRow {
    /// Row for a dataset with nothing to report: zero participants, no statistics.
    #[must_use]
    pub fn empty(dataset_id: &str) -> Self {
        Self {
            dataset_id: dataset_id.to_owned(),
            n_participants: 0,
            n_measurements: None,
            pct_positive: None,
            median_shedding_duration: None,
            iqr_shedding_duration: None,
            median_peak_value: None,
            iqr_peak_value: None,
            median_peak_time: None,
            pct_cleared: None,
            median_clearance_time: None,
        }
    }

    #[expect(clippy::cast_precision_loss)]
    fn from_summaries(
        dataset: &Dataset,
        filter: &MeasurementFilter,
        summaries: &[SheddingSummary],
        with_peaks: bool,
    ) -> Self {
        let shedding = summaries
            .iter()
            .filter(|s| s.clearance_status != ClearanceStatus::NoPositive)
            .collect::<Vec<_>>();
        if shedding.is_empty() {
            return Self::empty(&dataset.dataset_id);
        }

        let n_participants = shedding.len();
        let n_measurements = shedding.iter().map(|s| s.n_total).sum::<usize>();
        let n_positive = shedding.iter().map(|s| s.n_positive).sum::<usize>();
        let pct_positive = (n_measurements > 0).then(|| percent(n_positive as f64 / n_measurements as f64));

        let durations = QuartileSummary::new(shedding.iter().filter_map(|s| s.shedding_duration));
        let (peak_values, peak_times) = if with_peaks {
            (
                QuartileSummary::new(shedding.iter().filter_map(|s| s.peak_value)),
                QuartileSummary::new(shedding.iter().filter_map(|s| s.peak_time)),
            )
        } else {
            (None, None)
        };

        let n_cleared = shedding
            .iter()
            .filter(|s| s.clearance_status == ClearanceStatus::Cleared)
            .count();
        let cleared_ratio = n_cleared as f64 / n_participants as f64;
        let median_clearance_time = if cleared_ratio >= 0.5 {
            ClearanceSummary::from_dataset(dataset, filter, &[])
                .ok()
                .and_then(|summary| summary.median_clearance_time)
        } else {
            None
        };

        Self {
            dataset_id: dataset.dataset_id.clone(),
            n_participants,
            n_measurements: Some(n_measurements),
            pct_positive,
            median_shedding_duration: durations.as_ref().map(|q| q.median),
            iqr_shedding_duration: durations.as_ref().map(QuartileSummary::iqr_fixed),
            median_peak_value: peak_values.as_ref().map(|q| q.median),
            iqr_peak_value: peak_values.as_ref().map(QuartileSummary::iqr_scientific),
            median_peak_time: peak_times.map(|q| q.median),
            pct_cleared: Some(percent(cleared_ratio)),
            median_clearance_time,
        }
    }
}

/// One row per input dataset, in input order, plus pooling warnings.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub rows: Vec<ComparisonRow>,
    pub warnings: Vec<ComparisonWarning>,
}

fn percent(ratio: f64) -> f64 {
    (ratio * 1000.0).round() / 10.0
}

fn pooling_warnings(datasets: &[Dataset], filter: &MeasurementFilter) -> Vec<ComparisonWarning> {
    let specs = datasets.iter().flat_map(|d| d.analytes.values());
    let biomarkers = specs.clone().map(|s| s.biomarker.clone()).collect::<BTreeSet<_>>();
    let specimens = specs.clone().map(|s| s.specimen.label()).collect::<BTreeSet<_>>();
    let value_types = specs.map(|s| s.value_type()).collect::<BTreeSet<ValueType>>();

    let mut warnings = vec![];
    if biomarkers.len() > 1 && filter.biomarker.is_none() {
        warnings.push(ComparisonWarning::MultipleBiomarkers {
            biomarkers: biomarkers.into_iter().collect(),
        });
    }
    if specimens.len() > 1 && filter.specimen.is_none() {
        warnings.push(ComparisonWarning::MultipleSpecimens {
            specimens: specimens.into_iter().collect(),
        });
    }
    if value_types.len() > 1 && filter.value_type.is_none() {
        warnings.push(ComparisonWarning::MixedValueTypes);
    }
    warnings
}

/// Compares key shedding statistics across `datasets`.
///
/// # Examples
///
/// ```
/// # use shedding_analysis::{compare::compare_datasets, measurement::MeasurementFilter};
/// # use shedding_data::model::Dataset;
/// let yaml = r"
/// analyte:
///   specimen: stool
///   biomarker: SARS-CoV-2
///   unit: gc/mL
///   reference_event: symptom onset
/// participants:
///   - measurements: [{time: 1, value: 1000}, {time: 4, value: 100}, {time: 8, value: negative}]
///   - measurements: [{time: 2, value: negative}]
/// ";
/// let dataset = Dataset::from_yaml_str("demo", yaml).unwrap();
/// let comparison = compare_datasets(&[dataset], &MeasurementFilter::default()).unwrap();
/// let row = &comparison.rows[0];
/// assert_eq!(row.n_participants, 1);
/// assert_eq!(row.pct_positive, Some(66.7));
/// assert_eq!(row.median_shedding_duration, Some(4.0));
/// assert_eq!(row.iqr_peak_value.as_deref(), Some("1.00e+03-1.00e+03"));
/// assert_eq!(row.median_clearance_time, Some(8.0));
/// assert!(comparison.warnings.is_empty());
/// ```
pub fn compare_datasets(datasets: &[Dataset], filter: &MeasurementFilter) -> Result<Comparison, AnalysisError> {
    if datasets.is_empty() {
        return Err(AnalysisError::EmptyDatasetList);
    }

    let warnings = pooling_warnings(datasets, filter);
    for warning in &warnings {
        tracing::warn!("{warning}");
    }
    let with_peaks = !warnings.contains(&ComparisonWarning::MixedValueTypes);

    let rows = datasets
        .iter()
        .map(|dataset| match SheddingSummary::from_dataset(dataset, filter) {
            Ok(summaries) => ComparisonRow::from_summaries(dataset, filter, &summaries, with_peaks),
            Err(err) => {
                tracing::info!(dataset_id = %dataset.dataset_id, %err, "no comparable data in dataset");
                ComparisonRow::empty(&dataset.dataset_id)
            }
        })
        .collect();

    Ok(Comparison { rows, warnings })
}
