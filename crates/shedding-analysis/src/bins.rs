//! Time bins shared by the detection and value summaries

use serde::Serialize;
use shedding_stats::binning::CenteredBins;

use crate::{
    error::AnalysisError,
    measurement::{MeasurementRow, time_span},
};

/// Time binning of measurements for per-bin aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeBinOptions {
    /// Bin width in days. Bin centers are multiples of this.
    pub time_bin_size: f64,
    /// Bins with fewer rows are dropped.
    pub min_observations: usize,
}

impl Default for TimeBinOptions {
    fn default() -> Self {
        Self {
            time_bin_size: 1.0,
            min_observations: 1,
        }
    }
}

impl TimeBinOptions {
    /// Lays out bins over `time_range` if given, otherwise over the span of `rows`.
    pub(crate) fn bins_for(
        &self,
        rows: &[&MeasurementRow],
        time_range: Option<(f64, f64)>,
    ) -> Result<CenteredBins, AnalysisError> {
        let size = self.time_bin_size;
        if !(size.is_finite() && size > 0.0) {
            return Err(AnalysisError::InvalidBinSize(size));
        }
        let (min, max) = time_range
            .or_else(|| time_span(rows.iter().copied()))
            .ok_or(AnalysisError::NoMeasurements)?;
        if min > max {
            return Err(AnalysisError::NoMeasurementsInRange { min, max });
        }
        CenteredBins::covering(min, max, size).ok_or(AnalysisError::TooManyBins {
            min,
            max,
            bin_size: size,
        })
    }

    /// Groups `rows` into the bins with at least `min_observations` rows.
    ///
    /// Returns `(center, rows)` pairs in ascending time order.
    pub(crate) fn group<'a>(
        &self,
        rows: &[&'a MeasurementRow],
        time_range: Option<(f64, f64)>,
    ) -> Result<Vec<(f64, Vec<&'a MeasurementRow>)>, AnalysisError> {
        let bins = self.bins_for(rows, time_range)?;
        let groups = bins
            .group_by(rows, |row| row.time)
            .into_iter()
            .filter(|(_, members)| members.len() >= self.min_observations)
            .map(|(index, members)| (bins.center(index), members.into_iter().copied().collect()))
            .collect::<Vec<_>>();
        if groups.is_empty() {
            return Err(AnalysisError::InsufficientObservations {
                min_observations: self.min_observations,
            });
        }
        Ok(groups)
    }
}
