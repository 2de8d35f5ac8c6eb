//! Flat measurement table extracted from a dataset
//!
//! Every analysis starts here. [`MeasurementTable::extract`] walks the nested
//! participant/measurement records, joins in the metadata of each
//! measurement's analyte, applies a [`MeasurementFilter`] and drops rows that
//! cannot be placed on the time axis.
//!
//! # Filtering Order
//!
//! Filters are applied in a fixed order, and the first one that leaves
//! nothing is reported:
//!
//! 1. biomarker ([`AnalysisError::NoMatchingBiomarker`])
//! 2. specimen ([`AnalysisError::NoMatchingSpecimen`])
//! 3. value type ([`AnalysisError::NoMatchingValueType`])
//! 4. unknown times dropped ([`AnalysisError::NoMeasurements`])
//! 5. time range ([`AnalysisError::NoMeasurementsInRange`])
//!
//! Negative results are kept, since clearance and detection need them.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use shedding_data::model::{Dataset, Value, ValueType};

use crate::error::AnalysisError;

/// Row selection shared by all analyses.
///
/// # Examples
///
/// ```
/// use shedding_analysis::measurement::MeasurementFilter;
/// use shedding_data::model::ValueType;
///
/// let filter = MeasurementFilter::default()
///     .biomarker("SARS-CoV-2")
///     .value_type(ValueType::Ct)
///     .time_range(0.0, 28.0);
/// assert_eq!(filter.biomarker.as_deref(), Some("SARS-CoV-2"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeasurementFilter {
    /// Keep only analytes of this biomarker.
    pub biomarker: Option<String>,
    /// Keep only analytes whose specimen label equals this.
    ///
    /// Pooled specimens are labeled by joining them with `+`.
    pub specimen: Option<String>,
    /// Keep only analytes reporting this kind of value.
    pub value_type: Option<ValueType>,
    /// Keep only measurements with `min <= time <= max`.
    pub time_range: Option<(f64, f64)>,
}

impl MeasurementFilter {
    #[must_use]
    pub fn biomarker(mut self, biomarker: impl Into<String>) -> Self {
        self.biomarker = Some(biomarker.into());
        self
    }

    #[must_use]
    pub fn specimen(mut self, specimen: impl Into<String>) -> Self {
        self.specimen = Some(specimen.into());
        self
    }

    #[must_use]
    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    #[must_use]
    pub fn time_range(mut self, min: f64, max: f64) -> Self {
        self.time_range = Some((min, max));
        self
    }
}

/// One measurement enriched with the metadata of its analyte.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementRow {
    /// 1-based position of the participant in the dataset.
    pub participant_id: usize,
    /// Days since the analyte's reference event.
    pub time: f64,
    pub value: Value,
    pub analyte: String,
    /// Specimen label; pooled specimens are joined with `+`.
    pub specimen: String,
    pub biomarker: String,
    pub unit: String,
    pub reference_event: String,
    pub value_type: ValueType,
    pub limit_of_detection: Option<f64>,
}

impl MeasurementRow {
    /// Whether the biomarker was detected (any value except `"negative"`).
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.value.is_positive()
    }

    /// The numeric value, if quantified.
    #[must_use]
    pub fn quantity(&self) -> Option<f64> {
        self.value.quantity()
    }
}

/// Measurements of one dataset in participant and file order.
#[derive(Debug, Clone, Serialize)]
pub struct MeasurementTable {
    pub dataset_id: String,
    pub rows: Vec<MeasurementRow>,
}

impl MeasurementTable {
    /// Flattens `dataset` into rows selected by `filter`.
    ///
    /// Rows with an unknown time are dropped. The returned table is never empty.
    pub fn extract(dataset: &Dataset, filter: &MeasurementFilter) -> Result<Self, AnalysisError> {
        if dataset.participants.is_empty() {
            return Err(AnalysisError::MissingParticipants);
        }

        let mut candidates = vec![];
        for (participant_id, participant) in dataset.enumerate_participants() {
            for measurement in &participant.measurements {
                if let Some(spec) = dataset.analytes.get(&measurement.analyte) {
                    candidates.push((participant_id, measurement, spec));
                }
            }
        }
        if candidates.is_empty() {
            return Err(AnalysisError::NoMeasurements);
        }

        if let Some(biomarker) = &filter.biomarker {
            candidates.retain(|(_, _, spec)| spec.biomarker == *biomarker);
            if candidates.is_empty() {
                return Err(AnalysisError::NoMatchingBiomarker(biomarker.clone()));
            }
        }
        if let Some(specimen) = &filter.specimen {
            candidates.retain(|(_, _, spec)| spec.specimen.label() == *specimen);
            if candidates.is_empty() {
                return Err(AnalysisError::NoMatchingSpecimen(specimen.clone()));
            }
        }
        if let Some(value_type) = filter.value_type {
            candidates.retain(|(_, _, spec)| spec.value_type() == value_type);
            if candidates.is_empty() {
                return Err(AnalysisError::NoMatchingValueType(value_type));
            }
        }

        let mut rows = candidates
            .into_iter()
            .filter_map(|(participant_id, measurement, spec)| {
                let time = measurement.time.day()?;
                Some(MeasurementRow {
                    participant_id,
                    time,
                    value: measurement.value,
                    analyte: measurement.analyte.clone(),
                    specimen: spec.specimen.label(),
                    biomarker: spec.biomarker.clone(),
                    unit: spec.unit.clone(),
                    reference_event: spec.reference_event.clone(),
                    value_type: spec.value_type(),
                    limit_of_detection: spec.limit_of_detection.value(),
                })
            })
            .collect::<Vec<_>>();
        if rows.is_empty() {
            return Err(AnalysisError::NoMeasurements);
        }

        if let Some((min, max)) = filter.time_range {
            rows.retain(|row| min <= row.time && row.time <= max);
            if rows.is_empty() {
                return Err(AnalysisError::NoMeasurementsInRange { min, max });
            }
        }

        tracing::debug!(
            dataset_id = %dataset.dataset_id,
            rows = rows.len(),
            "extracted measurements"
        );
        Ok(Self {
            dataset_id: dataset.dataset_id.clone(),
            rows,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct value types present in the table.
    #[must_use]
    pub fn value_types(&self) -> BTreeSet<ValueType> {
        self.rows.iter().map(|row| row.value_type).collect()
    }

    /// Minimum and maximum time, or `None` for an empty table.
    #[must_use]
    pub fn time_span(&self) -> Option<(f64, f64)> {
        time_span(self.rows.iter())
    }

    /// Groups rows by participant, each group sorted by time.
    ///
    /// Sorting is stable, so rows at the same time keep their file order.
    #[must_use]
    pub fn by_participant(&self) -> BTreeMap<usize, Vec<&MeasurementRow>> {
        let mut groups: BTreeMap<usize, Vec<&MeasurementRow>> = BTreeMap::new();
        for row in &self.rows {
            groups.entry(row.participant_id).or_default().push(row);
        }
        for group in groups.values_mut() {
            group.sort_by(|a, b| a.time.total_cmp(&b.time));
        }
        groups
    }

    /// Groups rows by participant and analyte, each group sorted by time.
    #[must_use]
    pub fn by_participant_analyte(&self) -> BTreeMap<(usize, &str), Vec<&MeasurementRow>> {
        let mut groups: BTreeMap<(usize, &str), Vec<&MeasurementRow>> = BTreeMap::new();
        for row in &self.rows {
            groups
                .entry((row.participant_id, row.analyte.as_str()))
                .or_default()
                .push(row);
        }
        for group in groups.values_mut() {
            group.sort_by(|a, b| a.time.total_cmp(&b.time));
        }
        groups
    }
}

pub(crate) fn time_span<'a, I>(rows: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = &'a MeasurementRow>,
{
    rows.into_iter().fold(None, |span, row| match span {
        None => Some((row.time, row.time)),
        Some((min, max)) => Some((f64::min(min, row.time), f64::max(max, row.time))),
    })
}
