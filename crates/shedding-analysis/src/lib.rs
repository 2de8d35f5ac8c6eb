//! Shedding statistics over curated datasets
//!
//! This crate computes the derived tables used to describe and compare
//! biomarker shedding studies. Every analysis is a pure function of a loaded
//! [`Dataset`](shedding_data::model::Dataset) and a
//! [`MeasurementFilter`](measurement::MeasurementFilter).
//!
//! # Overview
//!
//! All analyses start from the same flat table:
//!
//! 1. **Extract** ([`measurement::MeasurementTable`]): Flatten participants and
//!    measurements, join analyte metadata, apply the filter
//! 2. **Analyze**, one of:
//!    - [`duration::SheddingDuration`]: First and last detection, inclusive duration
//!    - [`peak::SheddingPeak`]: Most extreme quantified value, lowest for cycle thresholds
//!    - [`summary::SheddingSummary`]: Detection window, peak and clearance status in one record
//!    - [`detection::DetectionSummary`]: Proportion positive per time bin with Wilson intervals
//!    - [`clearance::ClearanceSummary`]: Kaplan-Meier time to clearance with Greenwood bands
//!    - [`values::ValueSummary`]: Value distribution per time bin
//! 3. **Compare** ([`compare::compare_datasets`]): One row of key statistics per dataset
//!
//! [`overview::DatasetOverview`] describes a dataset without filtering.
//!
//! # Errors
//!
//! An analysis fails with [`error::AnalysisError`] only when nothing is left
//! to compute on. Individual participants or time bins without usable data
//! are skipped.
//!
//! # Examples
//!
//! ```
//! use shedding_analysis::{duration::SheddingDuration, measurement::MeasurementFilter};
//! use shedding_data::model::Dataset;
//!
//! let yaml = r"
//! analyte:
//!   specimen: stool
//!   biomarker: SARS-CoV-2
//!   unit: gc/mL
//!   reference_event: symptom onset
//! participants:
//!   - measurements: [{time: 0, value: 1.0}, {time: 1, value: 2.0}, {time: 2, value: negative}]
//!   - measurements: [{time: 0, value: negative}, {time: 1, value: 3.0}]
//! ";
//! let dataset = Dataset::from_yaml_str("example", yaml).unwrap();
//! let records = SheddingDuration::individual(&dataset, &MeasurementFilter::default()).unwrap();
//! let summary = SheddingDuration::summarize(&records);
//! let durations = summary[0].shedding_duration.unwrap();
//! assert_eq!((durations.min, durations.max), (1.0, 2.0));
//! ```

pub mod bins;
pub mod clearance;
pub mod compare;
pub mod detection;
pub mod duration;
pub mod error;
pub mod measurement;
pub mod overview;
pub mod peak;
pub mod quartiles;
pub mod summary;
pub mod values;

#[cfg(test)]
mod testing;
