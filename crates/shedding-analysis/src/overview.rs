//! Dataset overview
//!
//! Describes what a dataset contains before any analysis is run: who was
//! sampled, how often, and which analytes were measured.

use std::collections::BTreeSet;

use serde::Serialize;
use shedding_data::model::{Dataset, ValueType};

/// Metadata of one declared analyte.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyteDetail {
    pub analyte: String,
    pub biomarker: String,
    pub specimen: String,
    pub unit: String,
    pub value_type: ValueType,
    pub reference_event: String,
    pub limit_of_detection: Option<f64>,
    pub limit_of_quantification: Option<f64>,
}

/// Counts and metadata sets describing one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetOverview {
    pub dataset_id: String,
    pub title: Option<String>,
    /// The DOI, or the URL when the dataset has no DOI.
    pub doi: Option<String>,
    pub n_participants: usize,
    pub n_measurements: usize,
    /// Measurements other than `"negative"`, unknown times included.
    pub n_positive: usize,
    pub n_negative: usize,
    pub n_analytes: usize,
    pub biomarkers: BTreeSet<String>,
    pub specimens: BTreeSet<String>,
    pub value_types: BTreeSet<ValueType>,
    pub reference_events: BTreeSet<String>,
    /// Earliest and latest known measurement time.
    pub time_range: Option<(f64, f64)>,
    pub analyte_details: Vec<AnalyteDetail>,
}

impl DatasetOverview {
    /// Summarizes `dataset`. Never fails: empty datasets yield zero counts.
    ///
    /// # Examples
    ///
    /// ```
    /// # use shedding_analysis::overview::DatasetOverview;
    /// # use shedding_data::model::Dataset;
    /// let yaml = r"
    /// title: Demo study
    /// url: https://example.org/demo
    /// analyte:
    ///   specimen: [nasal_swab, throat_swab]
    ///   biomarker: SARS-CoV-2
    ///   unit: cycle threshold
    ///   reference_event: symptom onset
    ///   limit_of_detection: 40
    /// participants:
    ///   - measurements: [{time: 2, value: 25}, {time: unknown, value: negative}]
    /// ";
    /// let overview = DatasetOverview::from_dataset(&Dataset::from_yaml_str("demo", yaml).unwrap());
    /// assert_eq!(overview.doi.as_deref(), Some("https://example.org/demo"));
    /// assert_eq!((overview.n_positive, overview.n_negative), (1, 1));
    /// assert_eq!(overview.time_range, Some((2.0, 2.0)));
    /// assert!(overview.specimens.contains("nasal_swab+throat_swab"));
    /// assert_eq!(overview.analyte_details[0].limit_of_detection, Some(40.0));
    /// ```
    #[must_use]
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let analyte_details = dataset
            .analytes
            .iter()
            .map(|(name, spec)| AnalyteDetail {
                analyte: name.clone(),
                biomarker: spec.biomarker.clone(),
                specimen: spec.specimen.label(),
                unit: spec.unit.clone(),
                value_type: spec.value_type(),
                reference_event: spec.reference_event.clone(),
                limit_of_detection: spec.limit_of_detection.value(),
                limit_of_quantification: spec.limit_of_quantification.value(),
            })
            .collect::<Vec<_>>();

        let measurements = dataset.participants.iter().flat_map(|p| &p.measurements);
        let n_measurements = dataset.measurement_count();
        let n_positive = measurements.clone().filter(|m| m.value.is_positive()).count();
        let time_range = measurements
            .filter_map(|m| m.time.day())
            .fold(None, |range, t| match range {
                None => Some((t, t)),
                Some((min, max)) => Some((f64::min(min, t), f64::max(max, t))),
            });

        Self {
            dataset_id: dataset.dataset_id.clone(),
            title: dataset.title.clone(),
            doi: dataset.doi.clone().or_else(|| dataset.url.clone()),
            n_participants: dataset.participants.len(),
            n_measurements,
            n_positive,
            n_negative: n_measurements - n_positive,
            n_analytes: dataset.analytes.len(),
            biomarkers: analyte_details.iter().map(|d| d.biomarker.clone()).collect(),
            specimens: analyte_details.iter().map(|d| d.specimen.clone()).collect(),
            value_types: analyte_details.iter().map(|d| d.value_type).collect(),
            reference_events: analyte_details.iter().map(|d| d.reference_event.clone()).collect(),
            time_range,
            analyte_details,
        }
    }
}
