//! Shedding duration per participant and analyte
//!
//! The shedding duration is the inclusive day count between the first and
//! the last positive measurement:
//!
//! ```text
//! shedding_duration = last_detect − first_detect + 1
//! ```
//!
//! A participant whose samples were all negative has no detection window and
//! no duration. Such records still count towards `n_sample` and
//! `n_participant` of the summary.

use std::collections::BTreeMap;

use serde::Serialize;
use shedding_data::model::Dataset;

use crate::{
    error::AnalysisError,
    measurement::{MeasurementFilter, MeasurementRow, MeasurementTable},
    quartiles::Quartiles,
};

/// Detection window of one participant for one analyte.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheddingDuration {
    pub dataset_id: String,
    pub participant_id: usize,
    pub analyte: String,
    pub biomarker: String,
    pub specimen: String,
    pub reference_event: String,
    /// Number of samples with a known time.
    pub n_sample: usize,
    pub first_sample: f64,
    pub last_sample: f64,
    /// Time of the first positive sample.
    pub first_detect: Option<f64>,
    /// Time of the last positive sample.
    pub last_detect: Option<f64>,
    pub shedding_duration: Option<f64>,
}

/// Durations aggregated over participants sharing biomarker, specimen and reference event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationSummary {
    pub dataset_id: String,
    pub biomarker: String,
    pub specimen: String,
    pub reference_event: String,
    /// `None` if no participant in the group had a positive sample.
    pub shedding_duration: Option<Quartiles>,
    pub n_sample: usize,
    pub n_participant: usize,
}

impl SheddingDuration {
    /// Computes one record per participant and analyte.
    ///
    /// Records are ordered by participant, then analyte name.
    pub fn individual(dataset: &Dataset, filter: &MeasurementFilter) -> Result<Vec<Self>, AnalysisError> {
        let table = MeasurementTable::extract(dataset, filter)?;
        let records = table
            .by_participant_analyte()
            .into_iter()
            .filter_map(|((participant_id, analyte), rows)| {
                Self::from_rows(&table.dataset_id, participant_id, analyte, &rows)
            })
            .collect::<Vec<_>>();
        Ok(records)
    }

    fn from_rows(
        dataset_id: &str,
        participant_id: usize,
        analyte: &str,
        rows: &[&MeasurementRow],
    ) -> Option<Self> {
        let first = rows.first()?;
        let last = rows.last()?;
        let mut positive = rows.iter().filter(|row| row.is_positive()).map(|row| row.time);
        let first_detect = positive.next();
        let last_detect = positive.last().or(first_detect);
        let shedding_duration = first_detect
            .zip(last_detect)
            .map(|(first, last)| last - first + 1.0);

        Some(Self {
            dataset_id: dataset_id.to_owned(),
            participant_id,
            analyte: analyte.to_owned(),
            biomarker: first.biomarker.clone(),
            specimen: first.specimen.clone(),
            reference_event: first.reference_event.clone(),
            n_sample: rows.len(),
            first_sample: first.time,
            last_sample: last.time,
            first_detect,
            last_detect,
            shedding_duration,
        })
    }

    /// Aggregates records by dataset, biomarker, specimen and reference event.
    ///
    /// # Examples
    ///
    /// ```
    /// use shedding_analysis::duration::SheddingDuration;
    ///
    /// let record = |participant_id: usize, duration: Option<f64>| SheddingDuration {
    ///     dataset_id: "demo".into(),
    ///     participant_id,
    ///     analyte: "stool".into(),
    ///     biomarker: "SARS-CoV-2".into(),
    ///     specimen: "stool".into(),
    ///     reference_event: "symptom onset".into(),
    ///     n_sample: 3,
    ///     first_sample: 0.0,
    ///     last_sample: 10.0,
    ///     first_detect: duration.map(|_| 0.0),
    ///     last_detect: duration.map(|d| d - 1.0),
    ///     shedding_duration: duration,
    /// };
    /// let summary = SheddingDuration::summarize(&[
    ///     record(1, Some(4.0)),
    ///     record(2, Some(8.0)),
    ///     record(3, None),
    /// ]);
    /// assert_eq!(summary.len(), 1);
    /// let durations = summary[0].shedding_duration.unwrap();
    /// assert_eq!((durations.min, durations.max, durations.mean), (4.0, 8.0, 6.0));
    /// assert_eq!(summary[0].n_sample, 9);
    /// assert_eq!(summary[0].n_participant, 3);
    /// ```
    #[must_use]
    pub fn summarize(records: &[Self]) -> Vec<DurationSummary> {
        let mut groups: BTreeMap<(&str, &str, &str, &str), Vec<&Self>> = BTreeMap::new();
        for record in records {
            let key = (
                record.dataset_id.as_str(),
                record.biomarker.as_str(),
                record.specimen.as_str(),
                record.reference_event.as_str(),
            );
            groups.entry(key).or_default().push(record);
        }

        groups
            .into_iter()
            .map(|((dataset_id, biomarker, specimen, reference_event), group)| {
                let mut participants = group.iter().map(|r| r.participant_id).collect::<Vec<_>>();
                participants.sort_unstable();
                participants.dedup();
                DurationSummary {
                    dataset_id: dataset_id.to_owned(),
                    biomarker: biomarker.to_owned(),
                    specimen: specimen.to_owned(),
                    reference_event: reference_event.to_owned(),
                    shedding_duration: Quartiles::from_values(
                        group.iter().filter_map(|r| r.shedding_duration),
                    ),
                    n_sample: group.iter().map(|r| r.n_sample).sum(),
                    n_participant: participants.len(),
                }
            })
            .collect()
    }
}
