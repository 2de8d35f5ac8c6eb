use serde::Serialize;
use shedding_stats::summary::QuartileSummary;

/// Serializable min / quartiles / max / mean of a group of values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quartiles {
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
    pub mean: f64,
}

impl Quartiles {
    /// Summarizes `values`, or returns `None` if there are none.
    ///
    /// ```
    /// use shedding_analysis::quartiles::Quartiles;
    ///
    /// let q = Quartiles::from_values([2.0, 1.0]).unwrap();
    /// assert_eq!((q.min, q.median, q.max), (1.0, 1.5, 2.0));
    /// assert!(Quartiles::from_values(std::iter::empty()).is_none());
    /// ```
    #[must_use]
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        QuartileSummary::new(values).map(|s| Self::from(&s))
    }
}

impl From<&QuartileSummary> for Quartiles {
    fn from(summary: &QuartileSummary) -> Self {
        Self {
            min: summary.min,
            q25: summary.p25,
            median: summary.median,
            q75: summary.p75,
            max: summary.max,
            mean: summary.mean,
        }
    }
}
