//! Statistical kernels for biomarker shedding analysis.
//!
//! This crate provides the numeric building blocks used by the analysis layer:
//!
//! - **Descriptive statistics**: mean, median, sample standard deviation
//! - **Percentiles**: linear-interpolated percentiles and quartile summaries
//! - **Proportions**: Wilson score confidence intervals for binomial proportions
//! - **Binning**: fixed-width bins centered on multiples of the bin size
//! - **Survival analysis**: Kaplan-Meier estimator with Greenwood confidence bands
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`percentiles`]: Percentile computation and storage
//! - [`summary`]: Min / quartiles / max / mean summaries
//! - [`proportion`]: Wilson score intervals
//! - [`binning`]: Centered fixed-width time bins
//! - [`survival`]: Kaplan-Meier survival curves for analyzing time-to-event data
//!
//! # Examples
//!
//! ## Computing a quartile summary
//!
//! ```
//! use shedding_stats::summary::QuartileSummary;
//!
//! let durations = [3.0, 7.0, 9.0, 12.0, 14.0];
//! let summary = QuartileSummary::new(durations).unwrap();
//! assert_eq!(summary.median, 9.0);
//! ```
//!
//! ## Detection probability in a time bin
//!
//! ```
//! use shedding_stats::proportion::WilsonInterval;
//!
//! let ci = WilsonInterval::wilson_95(7, 10).unwrap();
//! assert!(ci.lower < 0.7 && 0.7 < ci.upper);
//! ```
//!
//! ## Analyzing clearance data
//!
//! ```
//! use shedding_stats::survival::KaplanMeierCurve;
//!
//! // Data: (time, is_censored)
//! let data = vec![
//!     (10.0, false), // Cleared at day 10
//!     (20.0, true),  // Still shedding at last sample, day 20
//!     (30.0, false), // Cleared at day 30
//! ];
//! let curve = KaplanMeierCurve::from_data(data);
//! assert_eq!(curve.median_survival(), Some(30.0));
//! ```

pub mod binning;
pub mod descriptive;
pub mod percentiles;
pub mod proportion;
pub mod summary;
pub mod survival;
