//! Measurement value trajectory per time bin
//!
//! Only quantified positive values enter the aggregates. Cycle thresholds and
//! concentrations live on different scales, so a table containing both is
//! rejected unless the filter selects one value type.

use serde::Serialize;
use shedding_data::model::{Dataset, ValueType};
use shedding_stats::{descriptive::DescriptiveStats, summary::QuartileSummary};

use crate::{
    bins::TimeBinOptions,
    error::AnalysisError,
    measurement::{MeasurementFilter, MeasurementTable},
};

/// Value statistics of one time bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueBin {
    /// Bin center in days.
    pub time: f64,
    pub n: usize,
    pub mean: f64,
    /// Sample standard deviation, `None` for a single value.
    pub std: Option<f64>,
    pub median: f64,
    pub q25: f64,
    pub q75: f64,
    pub min: f64,
    pub max: f64,
}

/// Binned value trajectory of one dataset.
#[derive(Debug, Clone, Serialize)]
pub struct ValueSummary {
    pub dataset_id: String,
    pub value_type: ValueType,
    pub options: TimeBinOptions,
    pub bins: Vec<ValueBin>,
}

impl ValueSummary {
    /// Summarizes quantified positive values per time bin.
    ///
    /// Without a time range, bins span the times of the quantified values only.
    pub fn from_dataset(
        dataset: &Dataset,
        filter: &MeasurementFilter,
        options: TimeBinOptions,
    ) -> Result<Self, AnalysisError> {
        let table = MeasurementTable::extract(dataset, filter)?;
        let value_types = table.value_types();
        let Some(&value_type) = value_types.first() else {
            return Err(AnalysisError::NoMeasurements);
        };
        if value_types.len() > 1 {
            return Err(AnalysisError::MixedValueTypes);
        }

        let quantified = table
            .rows
            .iter()
            .filter(|row| row.quantity().is_some())
            .collect::<Vec<_>>();
        if quantified.is_empty() {
            return Err(AnalysisError::NoMeasurements);
        }

        let bins = options
            .group(&quantified, filter.time_range)?
            .into_iter()
            .filter_map(|(time, members)| {
                let values = members.iter().filter_map(|row| row.quantity());
                let stats = DescriptiveStats::new(values.clone())?;
                let quartiles = QuartileSummary::new(values)?;
                Some(ValueBin {
                    time,
                    n: stats.count,
                    mean: stats.mean,
                    std: stats.std_dev,
                    median: stats.median,
                    q25: quartiles.p25,
                    q75: quartiles.p75,
                    min: stats.min,
                    max: stats.max,
                })
            })
            .collect();

        Ok(Self {
            dataset_id: table.dataset_id,
            value_type,
            options,
            bins,
        })
    }
}
