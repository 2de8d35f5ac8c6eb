use crate::{descriptive::DescriptiveStats, percentiles::Percentiles};

/// Quartile summary of a dataset: min, P25, median, P75, max, and mean.
///
/// This is the aggregate reported for shedding durations and peak timings,
/// combining [`DescriptiveStats`] with the quartiles from [`Percentiles`].
#[derive(Debug, Clone, PartialEq)]
pub struct QuartileSummary {
    /// Number of values summarized.
    pub count: usize,
    /// The minimum value.
    pub min: f64,
    /// The 25th percentile.
    pub p25: f64,
    /// The median.
    pub median: f64,
    /// The 75th percentile.
    pub p75: f64,
    /// The maximum value.
    pub max: f64,
    /// The arithmetic mean.
    pub mean: f64,
}

impl QuartileSummary {
    const QUARTILES: [f64; 2] = [25.0, 75.0];

    /// Summarizes unsorted values.
    ///
    /// Returns `None` if `values` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use shedding_stats::summary::QuartileSummary;
    ///
    /// let summary = QuartileSummary::new([1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
    /// assert_eq!(summary.min, 1.0);
    /// assert_eq!(summary.p25, 2.0);
    /// assert_eq!(summary.median, 3.0);
    /// assert_eq!(summary.p75, 4.0);
    /// assert_eq!(summary.max, 5.0);
    /// assert_eq!(summary.mean, 3.0);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        Self::from_sorted(&values)
    }

    /// Summarizes values that are already sorted in ascending order.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        let stats = DescriptiveStats::from_sorted(sorted_values)?;
        let percentiles = Percentiles::from_sorted(sorted_values, &Self::QUARTILES);

        Some(Self {
            count: stats.count,
            min: stats.min,
            p25: percentiles.get(25.0)?,
            median: stats.median,
            p75: percentiles.get(75.0)?,
            max: stats.max,
            mean: stats.mean,
        })
    }

    /// Formats the interquartile range as `"{p25}-{p75}"` with one decimal.
    #[must_use]
    pub fn iqr_fixed(&self) -> String {
        format!("{:.1}-{:.1}", self.p25, self.p75)
    }

    /// Formats the interquartile range in scientific notation with two decimals.
    ///
    /// Concentrations span many orders of magnitude, so this form is used for
    /// peak values. Exponents carry a sign and at least two digits.
    ///
    /// ```
    /// use shedding_stats::summary::QuartileSummary;
    ///
    /// let summary = QuartileSummary::new([1000.0, 2.5e-7]).unwrap();
    /// assert_eq!(summary.iqr_scientific(), "2.50e+02-7.50e+02");
    /// ```
    #[must_use]
    pub fn iqr_scientific(&self) -> String {
        format!("{}-{}", scientific(self.p25), scientific(self.p75))
    }
}

/// Formats `value` as `d.dde±XX`.
fn scientific(value: f64) -> String {
    let formatted = format!("{value:.2e}");
    let Some((mantissa, exponent)) = formatted.split_once('e') else {
        return formatted;
    };
    match exponent.parse::<i32>() {
        Ok(exp) => {
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        Err(_) => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert!(QuartileSummary::new(Vec::new()).is_none());
    }

    #[test]
    fn test_even_count_interpolates() {
        let summary = QuartileSummary::new([4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(summary.count, 4);
        assert_eq!(summary.p25, 1.75);
        assert_eq!(summary.median, 2.5);
        assert_eq!(summary.p75, 3.25);
    }

    #[test]
    fn test_scientific_exponent() {
        assert_eq!(scientific(1000.0), "1.00e+03");
        assert_eq!(scientific(0.0), "0.00e+00");
        assert_eq!(scientific(3.2e-12), "3.20e-12");
        assert_eq!(scientific(5.5e120), "5.50e+120");
    }

    #[test]
    fn test_iqr_fixed() {
        let summary = QuartileSummary::new([1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(summary.iqr_fixed(), "2.0-4.0");
    }
}
