//! Curated biomarker-shedding datasets.
//!
//! This crate turns the YAML dataset files of the corpus into typed,
//! validated [`Dataset`](model::Dataset) values:
//!
//! - [`model`]: Dataset, analyte, participant and measurement types
//! - [`document`]: Parsing, cross-reference validation and single-analyte normalization
//! - [`loader`]: Loading from a data directory, including bounded-parallel batch loading
//! - [`lookup`]: Checking whether a publication is already curated, by DOI or title
//!
//! Validation happens once, at load time. Code downstream of a loaded
//! [`Dataset`](model::Dataset) can rely on every measurement naming a declared
//! analyte and on every declared analyte being measured.

pub mod document;
pub mod loader;
pub mod lookup;
pub mod model;
