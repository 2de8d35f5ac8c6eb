//! Time to clearance with Kaplan-Meier estimation
//!
//! Each participant with at least one positive measurement enters the risk
//! set. Clearance is treated as the event of interest:
//!
//! ```text
//! no positive ──> shedding ──> cleared
//!  (excluded)     (censored)
//! ```
//!
//! - **Cleared**: the participant's last measurement is negative. The event
//!   time is the first negative after the last positive, or the latest
//!   negative if none lies after it.
//! - **Censored**: the last measurement is still positive. The participant is
//!   censored at the time of their last positive.
//!
//! The survival function `S(t)` is the proportion still shedding at time `t`.
//! See [`KaplanMeierCurve`] for the recurrence and the Greenwood band.

use serde::Serialize;
use shedding_data::model::Dataset;
use shedding_stats::survival::{KaplanMeierCurve, SurvivalPoint};

use crate::{
    error::AnalysisError,
    measurement::{MeasurementFilter, MeasurementRow, MeasurementTable},
};

/// Time points at which the survival function is reported by default, in days.
pub const DEFAULT_TIME_POINTS: [f64; 4] = [7.0, 14.0, 21.0, 28.0];

/// Clearance event of a group of measurements sorted by time.
///
/// Returns `(event_time, censored)`, or `None` if no measurement is positive.
pub(crate) fn clearance_event(sorted_rows: &[&MeasurementRow]) -> Option<(f64, bool)> {
    let last_positive = sorted_rows
        .iter()
        .filter(|row| row.is_positive())
        .map(|row| row.time)
        .reduce(f64::max)?;
    let last = sorted_rows.last()?;
    if last.is_positive() {
        return Some((last_positive, true));
    }

    let negatives = sorted_rows.iter().filter(|row| !row.is_positive());
    let first_after = negatives
        .clone()
        .map(|row| row.time)
        .filter(|&t| t > last_positive)
        .reduce(f64::min);
    let event_time = first_after.or_else(|| negatives.map(|row| row.time).reduce(f64::max))?;
    Some((event_time, false))
}

/// Clearance time and censoring status of one participant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClearanceRecord {
    pub participant_id: usize,
    pub clearance_time: f64,
    pub censored: bool,
}

/// One row of the survival table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SurvivalRow {
    pub time: f64,
    pub n_at_risk: usize,
    pub n_events: usize,
    pub n_censored: usize,
    pub survival: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

impl From<&SurvivalPoint> for SurvivalRow {
    fn from(point: &SurvivalPoint) -> Self {
        Self {
            time: point.time,
            n_at_risk: point.at_risk,
            n_events: point.events,
            n_censored: point.censored,
            survival: point.survival,
            ci_lower: point.ci_lower,
            ci_upper: point.ci_upper,
        }
    }
}

/// Survival function evaluated at a requested time point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimePointSummary {
    pub time: f64,
    /// Estimated proportion still shedding, `S(t)`.
    pub proportion_shedding: f64,
    /// Estimated proportion cleared, `1 − S(t)`.
    pub proportion_cleared: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub n_at_risk: usize,
}

/// Kaplan-Meier clearance analysis of one dataset.
#[derive(Debug, Clone, Serialize)]
pub struct ClearanceSummary {
    pub dataset_id: String,
    /// Participants with at least one positive measurement.
    pub n_participants: usize,
    pub n_cleared: usize,
    pub n_censored: usize,
    /// First time at which `S(t) <= 0.5`, if survival drops that far.
    pub median_clearance_time: Option<f64>,
    pub median_ci_lower: Option<f64>,
    pub median_ci_upper: Option<f64>,
    pub records: Vec<ClearanceRecord>,
    /// Survival steps, starting with the `t = 0, S = 1` row.
    pub survival_table: Vec<SurvivalRow>,
    pub time_points: Vec<TimePointSummary>,
}

impl ClearanceSummary {
    /// Runs the clearance analysis on the measurements selected by `filter`.
    ///
    /// Measurements of all selected analytes are pooled per participant.
    ///
    /// # Examples
    ///
    /// ```
    /// # use shedding_analysis::{clearance::{ClearanceSummary, DEFAULT_TIME_POINTS}, measurement::MeasurementFilter};
    /// # use shedding_data::model::Dataset;
    /// let yaml = r"
    /// analyte:
    ///   specimen: stool
    ///   biomarker: SARS-CoV-2
    ///   unit: gc/mL
    ///   reference_event: symptom onset
    /// participants:
    ///   - measurements: [{time: 2, value: 500}, {time: 9, value: negative}]
    ///   - measurements: [{time: 3, value: positive}, {time: 12, value: negative}]
    /// ";
    /// let dataset = Dataset::from_yaml_str("demo", yaml).unwrap();
    /// let summary =
    ///     ClearanceSummary::from_dataset(&dataset, &MeasurementFilter::default(), &DEFAULT_TIME_POINTS)
    ///         .unwrap();
    /// assert_eq!(summary.n_cleared, 2);
    /// assert_eq!(summary.median_clearance_time, Some(9.0));
    /// assert_eq!(summary.time_points[1].proportion_cleared, 1.0); // day 14
    /// ```
    pub fn from_dataset(
        dataset: &Dataset,
        filter: &MeasurementFilter,
        time_points: &[f64],
    ) -> Result<Self, AnalysisError> {
        let table = MeasurementTable::extract(dataset, filter)?;

        let records = table
            .by_participant()
            .into_iter()
            .filter_map(|(participant_id, rows)| {
                let (clearance_time, censored) = clearance_event(&rows)?;
                Some(ClearanceRecord {
                    participant_id,
                    clearance_time,
                    censored,
                })
            })
            .collect::<Vec<_>>();
        if records.is_empty() {
            return Err(AnalysisError::NoPositiveParticipants);
        }

        let curve = KaplanMeierCurve::from_data(
            records
                .iter()
                .map(|r| (r.clearance_time, r.censored))
                .collect(),
        );
        let n_participants = records.len();
        let n_cleared = records.iter().filter(|r| !r.censored).count();
        let median = curve.median_point();

        let time_points = time_points
            .iter()
            .map(|&time| match curve.point_at(time) {
                Some(point) => TimePointSummary {
                    time,
                    proportion_shedding: point.survival,
                    proportion_cleared: 1.0 - point.survival,
                    ci_lower: point.ci_lower,
                    ci_upper: point.ci_upper,
                    n_at_risk: point.at_risk,
                },
                None => TimePointSummary {
                    time,
                    proportion_shedding: 1.0,
                    proportion_cleared: 0.0,
                    ci_lower: 1.0,
                    ci_upper: 1.0,
                    n_at_risk: n_participants,
                },
            })
            .collect();

        tracing::debug!(
            dataset_id = %table.dataset_id,
            n_participants,
            n_cleared,
            "computed clearance curve"
        );
        Ok(Self {
            dataset_id: table.dataset_id.clone(),
            n_participants,
            n_cleared,
            n_censored: n_participants - n_cleared,
            median_clearance_time: median.map(|p| p.time),
            median_ci_lower: median.map(|p| p.ci_lower),
            median_ci_upper: median.map(|p| p.ci_upper),
            survival_table: curve.points.iter().map(SurvivalRow::from).collect(),
            records,
            time_points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::single_analyte;
    use shedding_data::model::Value::{Negative, Positive, Quantity};

    fn summary(participants: &[&[(f64, shedding_data::model::Value)]]) -> ClearanceSummary {
        let dataset = single_analyte("km", participants);
        ClearanceSummary::from_dataset(&dataset, &MeasurementFilter::default(), &DEFAULT_TIME_POINTS)
            .unwrap()
    }

    #[test]
    fn test_event_time_first_negative_after_last_positive() {
        let s = summary(&[&[
            (0.0, Negative),
            (2.0, Quantity(10.0)),
            (5.0, Negative),
            (8.0, Negative),
        ]]);
        assert_eq!(
            s.records,
            [ClearanceRecord {
                participant_id: 1,
                clearance_time: 5.0,
                censored: false,
            }]
        );
    }

    #[test]
    fn test_tied_negative_falls_back_to_latest_negative() {
        // The negative shares its time with the last positive but is ordered last.
        let s = summary(&[&[(1.0, Negative), (4.0, Positive), (4.0, Negative)]]);
        assert_eq!(s.records[0].clearance_time, 4.0);
        assert!(!s.records[0].censored);
    }

    #[test]
    fn test_all_censored() {
        let s = summary(&[
            &[(1.0, Positive), (3.0, Quantity(2.0))],
            &[(0.0, Negative), (6.0, Positive)],
        ]);
        assert_eq!(s.n_cleared, 0);
        assert_eq!(s.n_censored, 2);
        assert_eq!(s.median_clearance_time, None);
        assert_eq!(s.median_ci_lower, None);
        assert_eq!(s.survival_table.len(), 1);
        assert!(s.time_points.iter().all(|tp| tp.proportion_shedding == 1.0));
    }

    #[test]
    fn test_no_positive_participants() {
        let dataset = single_analyte("km", &[&[(1.0, Negative)], &[(2.0, Negative)]]);
        let err = ClearanceSummary::from_dataset(&dataset, &MeasurementFilter::default(), &[])
            .unwrap_err();
        assert_eq!(err, AnalysisError::NoPositiveParticipants);
    }

    #[test]
    fn test_negative_only_participants_excluded() {
        let s = summary(&[
            &[(1.0, Negative)],
            &[(1.0, Positive), (10.0, Negative)],
            &[(2.0, Positive), (20.0, Negative)],
        ]);
        assert_eq!(s.n_participants, 2);
        assert_eq!(s.survival_table[0].n_at_risk, 2);
        assert_eq!(s.median_clearance_time, Some(10.0));
    }

    #[test]
    fn test_time_points_follow_step_function() {
        let s = summary(&[
            &[(1.0, Positive), (5.0, Negative)],
            &[(1.0, Positive), (10.0, Negative)],
            &[(1.0, Positive), (16.0, Positive)],
            &[(1.0, Positive), (25.0, Negative)],
        ]);
        let at = |t: f64| s.time_points.iter().find(|tp| tp.time == t).unwrap();
        assert_eq!(at(7.0).proportion_shedding, 0.75);
        assert_eq!(at(7.0).n_at_risk, 4);
        assert_eq!(at(14.0).proportion_shedding, 0.5);
        assert_eq!(at(14.0).n_at_risk, 3);
        // Censoring at 16 leaves one at risk for the event at 25.
        assert_eq!(at(21.0).proportion_shedding, 0.5);
        assert_eq!(at(28.0).proportion_shedding, 0.0);
        assert_eq!(at(28.0).n_at_risk, 1);
        assert_eq!(s.median_clearance_time, Some(10.0));
        let last = s.survival_table.last().unwrap();
        assert_eq!(last.time, 25.0);
        assert_eq!(last.n_at_risk, 1);
    }
}
