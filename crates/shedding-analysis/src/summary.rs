//! Per-participant shedding summary
//!
//! One record per participant and analyte combining the detection window,
//! the peak and the clearance status, so that datasets can be compared on a
//! common footing without running each analysis separately.

use serde::Serialize;
use shedding_data::model::{Dataset, ValueType};

use crate::{
    clearance::clearance_event,
    error::AnalysisError,
    measurement::{MeasurementFilter, MeasurementRow, MeasurementTable},
    peak::select_peak,
};

/// How a participant's shedding ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum ClearanceStatus {
    /// A negative result followed the last positive one.
    #[display("cleared")]
    Cleared,
    /// The last measurement was still positive.
    #[display("censored")]
    Censored,
    /// No positive measurement at all.
    #[display("no_positive")]
    NoPositive,
}

/// Shedding summary of one participant for one analyte.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheddingSummary {
    pub participant_id: usize,
    pub analyte: String,
    pub biomarker: String,
    pub specimen: String,
    pub value_type: ValueType,
    pub reference_event: String,
    pub first_positive_time: Option<f64>,
    pub last_positive_time: Option<f64>,
    /// Inclusive day count `last − first + 1` between positives.
    pub shedding_duration: Option<f64>,
    /// Most extreme quantified positive value, lowest for cycle thresholds.
    pub peak_value: Option<f64>,
    pub peak_time: Option<f64>,
    pub n_positive: usize,
    pub n_negative: usize,
    pub n_total: usize,
    pub clearance_status: ClearanceStatus,
    pub clearance_time: Option<f64>,
}

impl SheddingSummary {
    /// Computes one record per participant and analyte selected by `filter`.
    pub fn from_dataset(dataset: &Dataset, filter: &MeasurementFilter) -> Result<Vec<Self>, AnalysisError> {
        let table = MeasurementTable::extract(dataset, filter)?;
        let records = table
            .by_participant_analyte()
            .into_iter()
            .filter_map(|((participant_id, analyte), rows)| Self::from_rows(participant_id, analyte, &rows))
            .collect::<Vec<_>>();
        if records.is_empty() {
            return Err(AnalysisError::NoMeasurements);
        }
        Ok(records)
    }

    fn from_rows(participant_id: usize, analyte: &str, rows: &[&MeasurementRow]) -> Option<Self> {
        let first = rows.first()?;
        let n_positive = rows.iter().filter(|r| r.is_positive()).count();
        let positive_times = rows.iter().filter(|r| r.is_positive()).map(|r| r.time);
        let first_positive_time = positive_times.clone().reduce(f64::min);
        let last_positive_time = positive_times.reduce(f64::max);
        let peak = select_peak(rows.iter().copied(), first.value_type);

        let (clearance_status, clearance_time) = match clearance_event(rows) {
            None => (ClearanceStatus::NoPositive, None),
            Some((time, true)) => (ClearanceStatus::Censored, Some(time)),
            Some((time, false)) => (ClearanceStatus::Cleared, Some(time)),
        };

        Some(Self {
            participant_id,
            analyte: analyte.to_owned(),
            biomarker: first.biomarker.clone(),
            specimen: first.specimen.clone(),
            value_type: first.value_type,
            reference_event: first.reference_event.clone(),
            first_positive_time,
            last_positive_time,
            shedding_duration: first_positive_time
                .zip(last_positive_time)
                .map(|(first, last)| last - first + 1.0),
            peak_value: peak.map(|(_, value)| value),
            peak_time: peak.map(|(row, _)| row.time),
            n_positive,
            n_negative: rows.len() - n_positive,
            n_total: rows.len(),
            clearance_status,
            clearance_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fixture, ct_analyte, single_analyte};
    use shedding_data::model::{
        Time,
        Value::{Negative, Positive, Quantity},
    };

    #[test]
    fn test_statuses() {
        let dataset = single_analyte(
            "s",
            &[
                &[(0.0, Quantity(5.0)), (3.0, Quantity(50.0)), (6.0, Negative)],
                &[(1.0, Negative), (4.0, Positive)],
                &[(1.0, Negative), (2.0, Negative)],
            ],
        );
        let records = SheddingSummary::from_dataset(&dataset, &MeasurementFilter::default()).unwrap();
        assert_eq!(records.len(), 3);

        let cleared = &records[0];
        assert_eq!(cleared.clearance_status, ClearanceStatus::Cleared);
        assert_eq!(cleared.clearance_time, Some(6.0));
        assert_eq!(cleared.shedding_duration, Some(4.0));
        assert_eq!(cleared.peak_value, Some(50.0));
        assert_eq!(cleared.peak_time, Some(3.0));
        assert_eq!((cleared.n_positive, cleared.n_negative, cleared.n_total), (2, 1, 3));

        let censored = &records[1];
        assert_eq!(censored.clearance_status, ClearanceStatus::Censored);
        assert_eq!(censored.clearance_time, Some(4.0));
        assert_eq!(censored.peak_value, None);

        let none = &records[2];
        assert_eq!(none.clearance_status, ClearanceStatus::NoPositive);
        assert_eq!(none.first_positive_time, None);
        assert_eq!(none.shedding_duration, None);
        assert_eq!(none.clearance_time, None);
    }

    #[test]
    fn test_ct_peak_is_lowest() {
        let dataset = Fixture::new("ct")
            .analyte("swab", ct_analyte(&["throat_swab"], "SARS-CoV-2"))
            .participant(&[
                ("swab", Time::Day(0.0), Quantity(28.0)),
                ("swab", Time::Day(2.0), Quantity(21.0)),
                ("swab", Time::Day(9.0), Negative),
            ])
            .build();
        let records = SheddingSummary::from_dataset(&dataset, &MeasurementFilter::default()).unwrap();
        assert_eq!(records[0].peak_value, Some(21.0));
        assert_eq!(records[0].peak_time, Some(2.0));
        assert_eq!(records[0].clearance_status.to_string(), "cleared");
    }
}
