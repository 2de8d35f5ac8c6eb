//! Parsing and validation of dataset documents
//!
//! A dataset file comes in one of two forms:
//!
//! - **single-analyte**: a top-level `analyte` mapping, and measurements
//!   without an `analyte` key
//! - **multi-analyte**: a top-level `analytes` mapping keyed by analyte name,
//!   and every measurement naming one of those keys
//!
//! [`Dataset::from_yaml_str`] accepts both, checks the cross-references the
//! YAML schema alone cannot express, and normalizes the single-analyte form to
//! a one-entry `analytes` map keyed by the dataset id.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::model::{AnalyteSpec, Dataset, Measurement, Participant, Time, Value};

/// Error returned when a dataset document cannot be turned into a [`Dataset`].
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum DatasetError {
    #[display("invalid YAML: {_0}")]
    Parse(serde_yaml::Error),
    #[display("invalid dataset: {_0}")]
    Invalid(ValidationError),
}

/// Structural rule violated by a parsed dataset document.
///
/// Participant and measurement positions are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ValidationError {
    #[display("dataset must have exactly one of `analyte` or `analytes`")]
    AnalyteDeclaration,
    #[display("dataset has no participants")]
    NoParticipants,
    #[display(
        "measurement {measurement} of participant {participant} has an `analyte` field, \
         but the dataset declares a single top-level `analyte`"
    )]
    UnexpectedAnalyte {
        participant: usize,
        measurement: usize,
    },
    #[display(
        "measurement {measurement} of participant {participant} has no `analyte` field, \
         but the dataset declares multiple `analytes`"
    )]
    MissingAnalyte {
        participant: usize,
        measurement: usize,
    },
    #[display("measurement {measurement} of participant {participant} refers to undeclared analyte `{analyte}`")]
    UndeclaredAnalyte {
        participant: usize,
        measurement: usize,
        analyte: String,
    },
    #[display("dataset declares unused analytes: {}", analytes.join(", "))]
    UnusedAnalytes { analytes: Vec<String> },
}

#[derive(Debug, Deserialize)]
struct RawDataset {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    doi: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    analyte: Option<AnalyteSpec>,
    #[serde(default)]
    analytes: Option<BTreeMap<String, AnalyteSpec>>,
    #[serde(default)]
    participants: Vec<RawParticipant>,
}

#[derive(Debug, Deserialize)]
struct RawParticipant {
    #[serde(default)]
    attributes: Option<BTreeMap<String, serde_yaml::Value>>,
    #[serde(default)]
    measurements: Vec<RawMeasurement>,
}

#[derive(Debug, Deserialize)]
struct RawMeasurement {
    #[serde(default)]
    analyte: Option<String>,
    time: Time,
    value: Value,
}

impl Dataset {
    /// Parses, validates and normalizes a dataset document.
    ///
    /// # Examples
    ///
    /// ```
    /// use shedding_data::model::{Dataset, Time, Value};
    ///
    /// let yaml = r"
    /// title: Example study
    /// doi: 10.1000/example
    /// analyte:
    ///   specimen: stool
    ///   biomarker: SARS-CoV-2
    ///   unit: gc/mL
    ///   reference_event: symptom onset
    ///   limit_of_detection: unknown
    ///   limit_of_quantification: 100
    /// participants:
    ///   - measurements:
    ///       - time: 1
    ///         value: 1.0e4
    ///       - time: 9
    ///         value: negative
    /// ";
    /// let dataset = Dataset::from_yaml_str("example2024", yaml).unwrap();
    /// assert_eq!(dataset.analytes.len(), 1);
    /// let measurement = &dataset.participants[0].measurements[1];
    /// assert_eq!(measurement.analyte, "example2024");
    /// assert_eq!(measurement.time, Time::Day(9.0));
    /// assert_eq!(measurement.value, Value::Negative);
    /// ```
    pub fn from_yaml_str(dataset_id: &str, text: &str) -> Result<Self, DatasetError> {
        let raw: RawDataset = serde_yaml::from_str(text).map_err(DatasetError::Parse)?;
        raw.into_dataset(dataset_id).map_err(DatasetError::Invalid)
    }
}

impl RawDataset {
    fn into_dataset(self, dataset_id: &str) -> Result<Dataset, ValidationError> {
        let Self {
            title,
            doi,
            url,
            description,
            analyte,
            analytes,
            participants,
        } = self;

        if participants.is_empty() {
            return Err(ValidationError::NoParticipants);
        }

        let (analytes, single) = match (analyte, analytes) {
            (Some(spec), None) => (BTreeMap::from([(dataset_id.to_owned(), spec)]), true),
            (None, Some(analytes)) => (analytes, false),
            _ => return Err(ValidationError::AnalyteDeclaration),
        };

        let mut used = BTreeSet::new();
        let mut normalized = Vec::with_capacity(participants.len());
        for (p_idx, participant) in participants.into_iter().enumerate() {
            let mut measurements = Vec::with_capacity(participant.measurements.len());
            for (m_idx, measurement) in participant.measurements.into_iter().enumerate() {
                let (participant_pos, measurement_pos) = (p_idx + 1, m_idx + 1);
                let analyte = match (single, measurement.analyte) {
                    (true, None) => dataset_id.to_owned(),
                    (true, Some(_)) => {
                        return Err(ValidationError::UnexpectedAnalyte {
                            participant: participant_pos,
                            measurement: measurement_pos,
                        });
                    }
                    (false, None) => {
                        return Err(ValidationError::MissingAnalyte {
                            participant: participant_pos,
                            measurement: measurement_pos,
                        });
                    }
                    (false, Some(name)) => {
                        if !analytes.contains_key(&name) {
                            return Err(ValidationError::UndeclaredAnalyte {
                                participant: participant_pos,
                                measurement: measurement_pos,
                                analyte: name,
                            });
                        }
                        name
                    }
                };
                used.insert(analyte.clone());
                measurements.push(Measurement {
                    analyte,
                    time: measurement.time,
                    value: measurement.value,
                });
            }
            normalized.push(Participant {
                attributes: participant.attributes,
                measurements,
            });
        }

        let unused: Vec<String> = analytes
            .keys()
            .filter(|name| !used.contains(*name))
            .cloned()
            .collect();
        if !unused.is_empty() {
            return Err(ValidationError::UnusedAnalytes { analytes: unused });
        }

        Ok(Dataset {
            dataset_id: dataset_id.to_owned(),
            title,
            doi,
            url,
            description,
            analytes,
            participants: normalized,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANALYTES: &str = r"
analytes:
  stool_rna:
    specimen: stool
    biomarker: SARS-CoV-2
    unit: gc/mL
    reference_event: symptom onset
    limit_of_detection: 100
    limit_of_quantification: unknown
  swab_ct:
    specimen: [nasal_swab, throat_swab]
    biomarker: SARS-CoV-2
    unit: cycle threshold
    reference_event: symptom onset
    limit_of_detection: 40
    limit_of_quantification: unknown
";

    fn multi(participants: &str) -> String {
        format!("title: Test\n{ANALYTES}participants:\n{participants}")
    }

    #[test]
    fn test_multi_analyte_form() {
        let yaml = multi(
            r"
  - attributes:
      age: 40
      sex: female
    measurements:
      - analyte: stool_rna
        time: 2
        value: 5000
      - analyte: swab_ct
        time: unknown
        value: 31.5
",
        );
        let dataset = Dataset::from_yaml_str("multi", &yaml).unwrap();
        assert_eq!(dataset.dataset_id, "multi");
        assert_eq!(dataset.analytes.len(), 2);
        assert_eq!(dataset.measurement_count(), 2);
        assert_eq!(dataset.limit_of_detection("stool_rna"), Some(100.0));
        assert_eq!(dataset.analytes["swab_ct"].specimen.label(), "nasal_swab+throat_swab");
        let attributes = dataset.participants[0].attributes.as_ref().unwrap();
        assert_eq!(attributes["sex"], serde_yaml::Value::from("female"));
    }

    #[test]
    fn test_both_or_neither_analyte_rejected() {
        let neither = "participants:\n  - measurements: []\n";
        assert!(matches!(
            Dataset::from_yaml_str("x", neither),
            Err(DatasetError::Invalid(ValidationError::AnalyteDeclaration))
        ));

        let both = format!(
            "analyte:\n  specimen: stool\n  biomarker: b\n  unit: u\n  reference_event: e\n{ANALYTES}participants:\n  - measurements: []\n"
        );
        assert!(matches!(
            Dataset::from_yaml_str("x", &both),
            Err(DatasetError::Invalid(ValidationError::AnalyteDeclaration))
        ));
    }

    #[test]
    fn test_missing_analyte_rejected() {
        let yaml = multi(
            r"
  - measurements:
      - analyte: stool_rna
        time: 1
        value: positive
      - time: 2
        value: negative
",
        );
        let err = Dataset::from_yaml_str("x", &yaml).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::Invalid(ValidationError::MissingAnalyte {
                participant: 1,
                measurement: 2
            })
        ));
    }

    #[test]
    fn test_undeclared_analyte_rejected() {
        let yaml = multi(
            r"
  - measurements:
      - analyte: serum
        time: 1
        value: positive
",
        );
        let err = Dataset::from_yaml_str("x", &yaml).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::Invalid(ValidationError::UndeclaredAnalyte { ref analyte, .. }) if analyte == "serum"
        ));
    }

    #[test]
    fn test_unused_analyte_rejected() {
        let yaml = multi(
            r"
  - measurements:
      - analyte: stool_rna
        time: 1
        value: positive
",
        );
        let err = Dataset::from_yaml_str("x", &yaml).unwrap_err();
        assert_eq!(err.to_string(), "invalid dataset: dataset declares unused analytes: swab_ct");
    }

    #[test]
    fn test_single_form_rejects_measurement_analyte() {
        let yaml = r"
analyte:
  specimen: stool
  biomarker: SARS-CoV-2
  unit: gc/mL
  reference_event: symptom onset
participants:
  - measurements:
      - analyte: stool
        time: 1
        value: positive
";
        assert!(matches!(
            Dataset::from_yaml_str("x", yaml),
            Err(DatasetError::Invalid(ValidationError::UnexpectedAnalyte { .. }))
        ));
    }

    #[test]
    fn test_bad_sentinel_is_parse_error() {
        let yaml = multi(
            r"
  - measurements:
      - analyte: stool_rna
        time: 1
        value: maybe
",
        );
        assert!(matches!(Dataset::from_yaml_str("x", &yaml), Err(DatasetError::Parse(_))));
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        let nan_time = multi(
            r"
  - measurements:
      - analyte: stool_rna
        time: .nan
        value: 5
      - analyte: swab_ct
        time: 2
        value: 30
",
        );
        let err = Dataset::from_yaml_str("x", &nan_time).unwrap_err();
        assert!(matches!(err, DatasetError::Parse(_)));
        assert!(err.to_string().contains("number must be finite"), "{err}");

        let inf_value = multi(
            r"
  - measurements:
      - analyte: stool_rna
        time: 1
        value: .inf
      - analyte: swab_ct
        time: 2
        value: negative
",
        );
        assert!(matches!(Dataset::from_yaml_str("x", &inf_value), Err(DatasetError::Parse(_))));

        let inf_limit = ANALYTES.replace("limit_of_detection: 100", "limit_of_detection: -.inf");
        let yaml = format!(
            "{inf_limit}participants:\n  - measurements:\n      - {{analyte: stool_rna, time: 1, value: 5}}\n      - {{analyte: swab_ct, time: 1, value: 30}}\n"
        );
        assert!(matches!(Dataset::from_yaml_str("x", &yaml), Err(DatasetError::Parse(_))));
    }

    #[test]
    fn test_no_participants_rejected() {
        let yaml = format!("{ANALYTES}participants: []\n");
        assert!(matches!(
            Dataset::from_yaml_str("x", &yaml),
            Err(DatasetError::Invalid(ValidationError::NoParticipants))
        ));
    }
}
