//! Typed dataset model
//!
//! Each curated study is stored as one YAML document. This module defines the
//! Rust types the document is parsed into, with the sentinel strings of the
//! file format (`"unknown"`, `"negative"`, `"positive"`) lifted into enum
//! variants so that downstream code never compares strings.
//!
//! # Data Structure
//!
//! ```text
//! Dataset
//! ├─ dataset_id, title, doi, url
//! ├─ analytes: name -> AnalyteSpec
//! │   ├─ specimen (one or several), biomarker, unit
//! │   ├─ reference_event
//! │   └─ limit_of_detection / limit_of_quantification
//! └─ participants: Vec<Participant>
//!     ├─ attributes (free-form demographics)
//!     └─ measurements: Vec<Measurement>
//!         └─ analyte, time (day | unknown), value (quantity | negative | positive)
//! ```

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// A curated shedding dataset with validated structure.
///
/// Instances are produced by [`Dataset::from_yaml_str`] or the
/// [`loader`](crate::loader) functions. Every measurement refers to a
/// declared analyte and every declared analyte is used by some measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    /// Dataset identifier, taken from the file name (e.g. `woelfel2020virological`).
    pub dataset_id: String,
    /// Title of the source publication.
    pub title: Option<String>,
    /// DOI of the source publication.
    pub doi: Option<String>,
    /// URL of the source publication when no DOI exists.
    pub url: Option<String>,
    /// Free-text description of the study.
    pub description: Option<String>,
    /// Analyte specifications keyed by analyte name.
    pub analytes: BTreeMap<String, AnalyteSpec>,
    /// Participants in file order. Participant ids are 1-based positions in this list.
    pub participants: Vec<Participant>,
}

impl Dataset {
    /// Total number of measurements across all participants.
    #[must_use]
    pub fn measurement_count(&self) -> usize {
        self.participants.iter().map(|p| p.measurements.len()).sum()
    }

    /// Iterates over `(participant_id, participant)` with 1-based ids.
    pub fn enumerate_participants(&self) -> impl Iterator<Item = (usize, &Participant)> {
        self.participants.iter().enumerate().map(|(i, p)| (i + 1, p))
    }
}

/// Specification of one analyte (biomarker measured in one specimen by one assay).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyteSpec {
    /// Specimen or specimens the analyte was measured in.
    pub specimen: Specimen,
    /// Biomarker name (e.g. `SARS-CoV-2`).
    pub biomarker: String,
    /// Unit of quantitative values (e.g. `gc/mL`, `cycle threshold`).
    pub unit: String,
    /// Event that time zero refers to (e.g. `symptom onset`).
    pub reference_event: String,
    /// Assay limit of detection.
    #[serde(default)]
    pub limit_of_detection: Limit,
    /// Assay limit of quantification.
    #[serde(default)]
    pub limit_of_quantification: Limit,
    /// Gene target of the assay, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gene_target: Option<String>,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AnalyteSpec {
    /// Whether values are cycle thresholds or concentrations.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        ValueType::from_unit(&self.unit)
    }
}

/// Specimen type of an analyte: a single specimen or a pooled list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Specimen {
    Single(String),
    Multiple(Vec<String>),
}

impl Specimen {
    /// Label used for grouping and filtering. Multiple specimens are joined with `+`.
    ///
    /// ```
    /// use shedding_data::model::Specimen;
    ///
    /// let pooled = Specimen::Multiple(vec!["nasal_swab".into(), "throat_swab".into()]);
    /// assert_eq!(pooled.label(), "nasal_swab+throat_swab");
    /// ```
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Specimen::Single(s) => s.clone(),
            Specimen::Multiple(list) => list.join("+"),
        }
    }
}

impl fmt::Display for Specimen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Kind of quantitative value reported by an analyte.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Higher values mean more biomarker (copies, PFU, ...).
    #[display("concentration")]
    Concentration,
    /// PCR cycle threshold: lower values mean more biomarker.
    #[display("ct")]
    Ct,
}

impl ValueType {
    /// Classifies a unit: cycle threshold iff its lower-cased form contains `ct` or `cycle`.
    ///
    /// ```
    /// use shedding_data::model::ValueType;
    ///
    /// assert_eq!(ValueType::from_unit("cycle threshold"), ValueType::Ct);
    /// assert_eq!(ValueType::from_unit("Ct value"), ValueType::Ct);
    /// assert_eq!(ValueType::from_unit("gc/mL"), ValueType::Concentration);
    /// ```
    #[must_use]
    pub fn from_unit(unit: &str) -> Self {
        let unit = unit.to_lowercase();
        if unit.contains("ct") || unit.contains("cycle") {
            ValueType::Ct
        } else {
            ValueType::Concentration
        }
    }

    /// Returns `true` if `candidate` ranks above `current` as a shedding peak.
    ///
    /// For cycle thresholds the lower value is the peak.
    #[must_use]
    pub fn is_more_extreme(self, candidate: f64, current: f64) -> bool {
        match self {
            ValueType::Concentration => candidate > current,
            ValueType::Ct => candidate < current,
        }
    }
}

/// An assay limit: a number or the sentinel `"unknown"`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "NumberOrText", into = "NumberOrText")]
pub enum Limit {
    Value(f64),
    #[default]
    Unknown,
}

impl Limit {
    #[must_use]
    pub fn value(self) -> Option<f64> {
        match self {
            Limit::Value(v) => Some(v),
            Limit::Unknown => None,
        }
    }
}

/// One participant of a study.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participant {
    /// Demographic attributes (age, sex, ...) as recorded in the file.
    pub attributes: Option<BTreeMap<String, serde_yaml::Value>>,
    /// Measurements in file order.
    pub measurements: Vec<Measurement>,
}

/// One measurement of one analyte at one time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    /// Name of the analyte, a key of [`Dataset::analytes`].
    pub analyte: String,
    /// Time relative to the analyte's reference event.
    pub time: Time,
    /// Measured value.
    pub value: Value,
}

/// Measurement time in days: a number or the sentinel `"unknown"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NumberOrText", into = "NumberOrText")]
pub enum Time {
    Day(f64),
    Unknown,
}

impl Time {
    #[must_use]
    pub fn day(self) -> Option<f64> {
        match self {
            Time::Day(d) => Some(d),
            Time::Unknown => None,
        }
    }
}

/// Measured value: a quantity, or a qualitative `"negative"` / `"positive"` result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NumberOrText", into = "NumberOrText")]
pub enum Value {
    Quantity(f64),
    Negative,
    Positive,
}

impl Value {
    /// Whether the biomarker was detected. Everything except `"negative"` counts.
    #[must_use]
    pub fn is_positive(self) -> bool {
        !matches!(self, Value::Negative)
    }

    /// The numeric value, if quantified.
    #[must_use]
    pub fn quantity(self) -> Option<f64> {
        match self {
            Value::Quantity(q) => Some(q),
            Value::Negative | Value::Positive => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Quantity(q) => write!(f, "{q}"),
            Value::Negative => f.write_str(NEGATIVE),
            Value::Positive => f.write_str(POSITIVE),
        }
    }
}

const UNKNOWN: &str = "unknown";
const NEGATIVE: &str = "negative";
const POSITIVE: &str = "positive";

/// Wire form shared by fields that hold a number or a sentinel string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// A scalar that is not valid for the field it appeared in.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum SentinelError {
    #[display("unexpected value '{text}', expected a number or {expected}")]
    Unexpected { text: String, expected: &'static str },
    #[display("number must be finite, got {_0}")]
    NonFinite(#[error(not(source))] f64),
}

impl SentinelError {
    fn unexpected(text: String, expected: &'static str) -> Self {
        Self::Unexpected { text, expected }
    }
}

fn finite(v: f64) -> Result<f64, SentinelError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(SentinelError::NonFinite(v))
    }
}

impl TryFrom<NumberOrText> for Limit {
    type Error = SentinelError;

    fn try_from(raw: NumberOrText) -> Result<Self, Self::Error> {
        match raw {
            NumberOrText::Number(v) => Ok(Limit::Value(finite(v)?)),
            NumberOrText::Text(t) if t == UNKNOWN => Ok(Limit::Unknown),
            NumberOrText::Text(t) => Err(SentinelError::unexpected(t, "'unknown'")),
        }
    }
}

impl From<Limit> for NumberOrText {
    fn from(limit: Limit) -> Self {
        match limit {
            Limit::Value(v) => NumberOrText::Number(v),
            Limit::Unknown => NumberOrText::Text(UNKNOWN.to_owned()),
        }
    }
}

impl TryFrom<NumberOrText> for Time {
    type Error = SentinelError;

    fn try_from(raw: NumberOrText) -> Result<Self, Self::Error> {
        match raw {
            NumberOrText::Number(v) => Ok(Time::Day(finite(v)?)),
            NumberOrText::Text(t) if t == UNKNOWN => Ok(Time::Unknown),
            NumberOrText::Text(t) => Err(SentinelError::unexpected(t, "'unknown'")),
        }
    }
}

impl From<Time> for NumberOrText {
    fn from(time: Time) -> Self {
        match time {
            Time::Day(v) => NumberOrText::Number(v),
            Time::Unknown => NumberOrText::Text(UNKNOWN.to_owned()),
        }
    }
}

impl TryFrom<NumberOrText> for Value {
    type Error = SentinelError;

    fn try_from(raw: NumberOrText) -> Result<Self, Self::Error> {
        match raw {
            NumberOrText::Number(v) => Ok(Value::Quantity(finite(v)?)),
            NumberOrText::Text(t) if t == NEGATIVE => Ok(Value::Negative),
            NumberOrText::Text(t) if t == POSITIVE => Ok(Value::Positive),
            NumberOrText::Text(t) => Err(SentinelError::unexpected(t, "'negative' or 'positive'")),
        }
    }
}

impl From<Value> for NumberOrText {
    fn from(value: Value) -> Self {
        match value {
            Value::Quantity(v) => NumberOrText::Number(v),
            Value::Negative => NumberOrText::Text(NEGATIVE.to_owned()),
            Value::Positive => NumberOrText::Text(POSITIVE.to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_parse() {
        let time: Time = serde_yaml::from_str("unknown").unwrap();
        assert_eq!(time, Time::Unknown);
        let time: Time = serde_yaml::from_str("3").unwrap();
        assert_eq!(time, Time::Day(3.0));
        let value: Value = serde_yaml::from_str("negative").unwrap();
        assert!(!value.is_positive());
        let value: Value = serde_yaml::from_str("positive").unwrap();
        assert!(value.is_positive());
        assert_eq!(value.quantity(), None);
        let value: Value = serde_yaml::from_str("1.5e4").unwrap();
        assert_eq!(value.quantity(), Some(15000.0));
    }

    #[test]
    fn test_invalid_sentinel_rejected() {
        assert!(serde_yaml::from_str::<Value>("unknown").is_err());
        assert!(serde_yaml::from_str::<Time>("later").is_err());
        assert!(serde_yaml::from_str::<Limit>("n/a").is_err());
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        assert!(serde_yaml::from_str::<Time>(".nan").is_err());
        assert!(serde_yaml::from_str::<Time>("-.inf").is_err());
        assert!(serde_yaml::from_str::<Value>(".inf").is_err());
        assert!(serde_yaml::from_str::<Limit>(".nan").is_err());
        assert!(matches!(finite(f64::INFINITY), Err(SentinelError::NonFinite(v)) if v.is_infinite()));
        assert_eq!(finite(-2.5).unwrap(), -2.5);
    }

    #[test]
    fn test_specimen_forms() {
        let single: Specimen = serde_yaml::from_str("stool").unwrap();
        assert_eq!(single.label(), "stool");
        let multiple: Specimen = serde_yaml::from_str("[nasal_swab, throat_swab]").unwrap();
        assert_eq!(multiple.label(), "nasal_swab+throat_swab");
    }

    #[test]
    fn test_peak_direction() {
        assert!(ValueType::Ct.is_more_extreme(20.0, 30.0));
        assert!(!ValueType::Ct.is_more_extreme(35.0, 30.0));
        assert!(ValueType::Concentration.is_more_extreme(1e6, 1e3));
    }
}
