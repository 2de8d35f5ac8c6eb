//! Shedding peak per participant and analyte
//!
//! The peak is the most extreme quantified value of a participant's analyte.
//! Its direction depends on the unit: for concentrations the peak is the
//! maximum, for cycle thresholds it is the minimum, since a lower cycle
//! threshold means more biomarker. Ties keep the earliest sample in file order.
//!
//! Groups with no quantified value (only `"positive"`/`"negative"`) produce no
//! record at all.

use std::collections::BTreeMap;

use serde::Serialize;
use shedding_data::model::{Dataset, ValueType};

use crate::{
    error::AnalysisError,
    measurement::{MeasurementFilter, MeasurementRow, MeasurementTable, time_span},
    quartiles::Quartiles,
};

/// Peak of one participant for one analyte.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheddingPeak {
    pub dataset_id: String,
    pub participant_id: usize,
    pub analyte: String,
    pub biomarker: String,
    pub specimen: String,
    pub reference_event: String,
    pub unit: String,
    pub value_type: ValueType,
    pub n_sample: usize,
    pub first_sample: f64,
    pub last_sample: f64,
    /// Time of the peak.
    pub peak_time: f64,
    /// Value at the peak.
    pub peak_value: f64,
}

/// Peak times and values aggregated over participants of the same group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakSummary {
    pub dataset_id: String,
    pub biomarker: String,
    pub specimen: String,
    pub reference_event: String,
    pub unit: String,
    pub peak_time: Quartiles,
    pub peak_value: Quartiles,
    pub n_sample: usize,
    pub n_participant: usize,
}

/// Returns the row holding the peak value, or `None` if no row is quantified.
///
/// Rows are scanned in the given order and the first extreme value wins.
pub(crate) fn select_peak<'a, I>(rows: I, value_type: ValueType) -> Option<(&'a MeasurementRow, f64)>
where
    I: IntoIterator<Item = &'a MeasurementRow>,
{
    rows.into_iter()
        .filter_map(|row| row.quantity().map(|value| (row, value)))
        .fold(None, |best, (row, value)| match best {
            Some((_, best_value)) if !value_type.is_more_extreme(value, best_value) => best,
            _ => Some((row, value)),
        })
}

impl SheddingPeak {
    /// Computes one record per participant and analyte with a quantified value.
    pub fn individual(dataset: &Dataset, filter: &MeasurementFilter) -> Result<Vec<Self>, AnalysisError> {
        let table = MeasurementTable::extract(dataset, filter)?;
        let mut in_file_order: BTreeMap<(usize, &str), Vec<&MeasurementRow>> = BTreeMap::new();
        for row in &table.rows {
            in_file_order
                .entry((row.participant_id, row.analyte.as_str()))
                .or_default()
                .push(row);
        }

        let records = in_file_order
            .into_iter()
            .filter_map(|((participant_id, analyte), rows)| {
                let first = *rows.first()?;
                let (peak_row, peak_value) = select_peak(rows.iter().copied(), first.value_type)?;
                let (first_sample, last_sample) = time_span(rows.iter().copied())?;
                Some(Self {
                    dataset_id: table.dataset_id.clone(),
                    participant_id,
                    analyte: analyte.to_owned(),
                    biomarker: first.biomarker.clone(),
                    specimen: first.specimen.clone(),
                    reference_event: first.reference_event.clone(),
                    unit: first.unit.clone(),
                    value_type: first.value_type,
                    n_sample: rows.len(),
                    first_sample,
                    last_sample,
                    peak_time: peak_row.time,
                    peak_value,
                })
            })
            .collect::<Vec<_>>();

        if records.is_empty() {
            tracing::warn!(dataset_id = %table.dataset_id, "no quantified values for shedding peak");
        }
        Ok(records)
    }

    /// Aggregates records by dataset, biomarker, specimen, reference event and unit.
    #[must_use]
    pub fn summarize(records: &[Self]) -> Vec<PeakSummary> {
        let mut groups: BTreeMap<(&str, &str, &str, &str, &str), Vec<&Self>> = BTreeMap::new();
        for record in records {
            let key = (
                record.dataset_id.as_str(),
                record.biomarker.as_str(),
                record.specimen.as_str(),
                record.reference_event.as_str(),
                record.unit.as_str(),
            );
            groups.entry(key).or_default().push(record);
        }

        groups
            .into_iter()
            .filter_map(|((dataset_id, biomarker, specimen, reference_event, unit), group)| {
                let mut participants = group.iter().map(|r| r.participant_id).collect::<Vec<_>>();
                participants.sort_unstable();
                participants.dedup();
                Some(PeakSummary {
                    dataset_id: dataset_id.to_owned(),
                    biomarker: biomarker.to_owned(),
                    specimen: specimen.to_owned(),
                    reference_event: reference_event.to_owned(),
                    unit: unit.to_owned(),
                    peak_time: Quartiles::from_values(group.iter().map(|r| r.peak_time))?,
                    peak_value: Quartiles::from_values(group.iter().map(|r| r.peak_value))?,
                    n_sample: group.iter().map(|r| r.n_sample).sum(),
                    n_participant: participants.len(),
                })
            })
            .collect()
    }
}
