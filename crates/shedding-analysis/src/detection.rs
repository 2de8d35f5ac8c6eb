//! Detection probability over time
//!
//! Measurements are binned by time (see [`TimeBinOptions`]) and, per bin, the
//! proportion of positive results is reported with a 95% Wilson score
//! interval. Bins with fewer than `min_observations` measurements are
//! dropped rather than reported as zero.
//!
//! When the filter carries a time range, bins span the range rather than the
//! observed times, so bin centers are comparable across datasets.

use serde::Serialize;
use shedding_data::model::Dataset;
use shedding_stats::proportion::WilsonInterval;

use crate::{
    bins::TimeBinOptions,
    error::AnalysisError,
    measurement::{MeasurementFilter, MeasurementTable},
};

/// Detection statistics of one time bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DetectionBin {
    /// Bin center in days.
    pub time: f64,
    pub n_tested: usize,
    pub n_positive: usize,
    pub n_negative: usize,
    /// `n_positive / n_tested`.
    pub proportion: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

/// Detection probability curve of one dataset.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionSummary {
    pub dataset_id: String,
    pub options: TimeBinOptions,
    /// Non-empty bins in ascending time order.
    pub bins: Vec<DetectionBin>,
}

impl DetectionSummary {
    /// Computes the detection probability per time bin.
    ///
    /// # Examples
    ///
    /// ```
    /// # use shedding_analysis::{bins::TimeBinOptions, detection::DetectionSummary, measurement::MeasurementFilter};
    /// # use shedding_data::model::Dataset;
    /// let yaml = r"
    /// analyte:
    ///   specimen: stool
    ///   biomarker: SARS-CoV-2
    ///   unit: gc/mL
    ///   reference_event: symptom onset
    /// participants:
    ///   - measurements: [{time: 1, value: positive}, {time: 8, value: negative}]
    ///   - measurements: [{time: 2, value: 300}, {time: 6, value: 20}]
    /// ";
    /// let dataset = Dataset::from_yaml_str("demo", yaml).unwrap();
    /// let options = TimeBinOptions { time_bin_size: 7.0, min_observations: 1 };
    /// let summary =
    ///     DetectionSummary::from_dataset(&dataset, &MeasurementFilter::default(), options).unwrap();
    /// // Bins centered on days 0 and 7: (-3.5, 3.5] and (3.5, 10.5].
    /// assert_eq!(summary.bins.len(), 2);
    /// assert_eq!(summary.bins[0].proportion, 1.0);
    /// assert_eq!(summary.bins[1].n_tested, 2);
    /// assert_eq!(summary.bins[1].proportion, 0.5);
    /// ```
    pub fn from_dataset(
        dataset: &Dataset,
        filter: &MeasurementFilter,
        options: TimeBinOptions,
    ) -> Result<Self, AnalysisError> {
        let table = MeasurementTable::extract(dataset, filter)?;
        let rows = table.rows.iter().collect::<Vec<_>>();

        let bins = options
            .group(&rows, filter.time_range)?
            .into_iter()
            .filter_map(|(time, members)| {
                let n_tested = members.len();
                let n_positive = members.iter().filter(|row| row.is_positive()).count();
                let ci = WilsonInterval::wilson_95(n_positive, n_tested)?;
                Some(DetectionBin {
                    time,
                    n_tested,
                    n_positive,
                    n_negative: n_tested - n_positive,
                    proportion: ci.proportion,
                    ci_lower: ci.lower,
                    ci_upper: ci.upper,
                })
            })
            .collect();

        Ok(Self {
            dataset_id: table.dataset_id,
            options,
            bins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::single_analyte;
    use shedding_data::model::Value::{Negative, Positive, Quantity};

    #[test]
    fn test_daily_bins() {
        let dataset = single_analyte(
            "det",
            &[
                &[(0.0, Positive), (1.0, Positive), (2.0, Negative)],
                &[(0.0, Quantity(4.0)), (1.0, Negative), (2.0, Negative)],
                &[(0.4, Positive), (1.4, Positive)],
            ],
        );
        let summary =
            DetectionSummary::from_dataset(&dataset, &MeasurementFilter::default(), TimeBinOptions::default())
                .unwrap();
        let times = summary.bins.iter().map(|b| b.time).collect::<Vec<_>>();
        assert_eq!(times, [0.0, 1.0, 2.0]);
        assert_eq!(summary.bins[0].n_tested, 3);
        assert_eq!(summary.bins[0].proportion, 1.0);
        assert_eq!(summary.bins[1].n_positive, 2);
        assert_eq!(summary.bins[2].proportion, 0.0);
        for bin in &summary.bins {
            assert!(bin.ci_lower <= bin.proportion && bin.proportion <= bin.ci_upper);
            assert!(bin.ci_lower >= 0.0 && bin.ci_upper <= 1.0);
        }
    }

    #[test]
    fn test_sparse_bins_dropped() {
        let dataset = single_analyte(
            "det",
            &[&[(0.0, Positive), (5.0, Positive)], &[(0.0, Negative)]],
        );
        let options = TimeBinOptions {
            time_bin_size: 1.0,
            min_observations: 2,
        };
        let summary = DetectionSummary::from_dataset(&dataset, &MeasurementFilter::default(), options).unwrap();
        assert_eq!(summary.bins.len(), 1);
        assert_eq!(summary.bins[0].time, 0.0);
        assert_eq!(summary.bins[0].proportion, 0.5);
    }

    #[test]
    fn test_no_bin_meets_threshold() {
        let dataset = single_analyte("det", &[&[(0.0, Positive), (5.0, Positive)]]);
        let options = TimeBinOptions {
            time_bin_size: 1.0,
            min_observations: 3,
        };
        let err = DetectionSummary::from_dataset(&dataset, &MeasurementFilter::default(), options).unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientObservations { min_observations: 3 });
    }

    #[test]
    fn test_invalid_bin_size() {
        let dataset = single_analyte("det", &[&[(0.0, Positive)]]);
        let options = TimeBinOptions {
            time_bin_size: 0.0,
            min_observations: 1,
        };
        let err = DetectionSummary::from_dataset(&dataset, &MeasurementFilter::default(), options).unwrap_err();
        assert_eq!(err, AnalysisError::InvalidBinSize(0.0));
    }

    #[test]
    fn test_range_too_wide_for_bins() {
        let dataset = single_analyte("det", &[&[(1.0, Positive), (2.0, Negative)]]);
        let filter = MeasurementFilter::default().time_range(-1e300, 1e300);
        let err = DetectionSummary::from_dataset(&dataset, &filter, TimeBinOptions::default()).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::TooManyBins {
                min: -1e300,
                max: 1e300,
                bin_size: 1.0,
            }
        );

        let options = TimeBinOptions {
            time_bin_size: 1e299,
            min_observations: 1,
        };
        let summary = DetectionSummary::from_dataset(&dataset, &filter, options).unwrap();
        assert_eq!(summary.bins.len(), 1);
        assert_eq!(summary.bins[0].n_tested, 2);
    }

    #[test]
    fn test_time_range_sets_bin_layout() {
        let dataset = single_analyte("det", &[&[(3.0, Positive), (30.0, Negative)]]);
        let filter = MeasurementFilter::default().time_range(-7.0, 14.0);
        let options = TimeBinOptions {
            time_bin_size: 7.0,
            min_observations: 1,
        };
        let summary = DetectionSummary::from_dataset(&dataset, &filter, options).unwrap();
        assert_eq!(summary.bins.len(), 1);
        assert_eq!(summary.bins[0].time, 0.0);
    }
}
