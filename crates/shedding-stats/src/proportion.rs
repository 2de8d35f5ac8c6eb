//! Binomial proportions with Wilson score confidence intervals
//!
//! The Wilson score interval stays inside `[0, 1]` and behaves well for the
//! small per-bin sample sizes typical of longitudinal cohorts, where the
//! normal approximation collapses to zero width at `p = 0` or `p = 1`.

/// Two-sided 95% normal quantile.
pub const Z_95: f64 = 1.96;

/// Observed proportion of successes with its Wilson score interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WilsonInterval {
    /// Number of trials.
    pub trials: usize,
    /// Number of successes.
    pub successes: usize,
    /// Observed proportion `successes / trials`.
    pub proportion: f64,
    /// Lower bound, clipped to 0.
    pub lower: f64,
    /// Upper bound, clipped to 1.
    pub upper: f64,
}

impl WilsonInterval {
    /// Computes the interval for `successes` out of `trials` at normal quantile `z`.
    ///
    /// ```text
    /// center = (p + z²/2n) / (1 + z²/n)
    /// margin = z·sqrt(p(1−p)/n + z²/4n²) / (1 + z²/n)
    /// ```
    ///
    /// Returns `None` when `trials` is zero or `successes > trials`.
    ///
    /// # Examples
    ///
    /// ```
    /// use shedding_stats::proportion::{WilsonInterval, Z_95};
    ///
    /// let ci = WilsonInterval::new(5, 10, Z_95).unwrap();
    /// assert_eq!(ci.proportion, 0.5);
    /// assert!(ci.lower < 0.5 && ci.upper > 0.5);
    /// assert!((ci.lower + ci.upper - 1.0).abs() < 1e-12);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new(successes: usize, trials: usize, z: f64) -> Option<Self> {
        if trials == 0 || successes > trials {
            return None;
        }

        let n = trials as f64;
        let p = successes as f64 / n;
        let z2 = z * z;
        let denominator = 1.0 + z2 / n;
        let center = (p + z2 / (2.0 * n)) / denominator;
        let margin = z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / denominator;

        Some(Self {
            trials,
            successes,
            proportion: p,
            lower: (center - margin).max(0.0),
            upper: (center + margin).min(1.0),
        })
    }

    /// Computes the 95% interval.
    #[must_use]
    pub fn wilson_95(successes: usize, trials: usize) -> Option<Self> {
        Self::new(successes, trials, Z_95)
    }
}
