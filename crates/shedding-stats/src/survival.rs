/// One step of a Kaplan-Meier survival curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurvivalPoint {
    /// Time of this step.
    pub time: f64,
    /// Number of subjects at risk just before `time`.
    pub at_risk: usize,
    /// Number of events observed at `time`.
    pub events: usize,
    /// Number of subjects censored at `time`.
    pub censored: usize,
    /// Survival probability after accounting for the events at `time`.
    pub survival: f64,
    /// Lower bound of the 95% confidence band, clipped to 0.
    pub ci_lower: f64,
    /// Upper bound of the 95% confidence band, clipped to 1.
    pub ci_upper: f64,
}

/// Kaplan-Meier survival curve for survival analysis.
///
/// The Kaplan-Meier estimator is a non-parametric statistic used to estimate the survival
/// function from lifetime data. It accounts for censored data (observations where the event
/// of interest has not occurred by the end of the study period).
///
/// # Recurrence
///
/// Observations are sorted by time and tied times are processed as one cohort.
/// At each time `t` with `d` events, `c` censorings and `n` subjects at risk:
///
/// ```text
/// S(t)    = S(t⁻) × (1 − d/n)
/// Var    += d / (n·(n − d))            (Greenwood, skipped when n == d)
/// CI      = S(t) ± 1.96·S(t)·sqrt(Var)
/// n      -= d + c
/// ```
///
/// # Points
///
/// The curve starts with a point at time 0 where survival is 1 and every
/// subject is at risk. A further point is recorded at each time where at
/// least one event occurred; times with only censorings reduce the risk set
/// without adding a point, so `points` describes the survival step function.
#[derive(Debug, Clone)]
pub struct KaplanMeierCurve {
    /// Total number of subjects.
    pub subjects: usize,
    /// Steps of the survival function, starting with the time-0 point.
    pub points: Vec<SurvivalPoint>,
}

impl KaplanMeierCurve {
    /// Normal quantile for the confidence band.
    const Z: f64 = 1.96;

    /// Computes the Kaplan-Meier survival curve from survival data.
    ///
    /// # Arguments
    ///
    /// * `data` - A vector of tuples where each tuple contains:
    ///   - `time`: The time at which the observation occurred
    ///   - `is_censored`: `true` if the observation was censored (event did not occur),
    ///     `false` if the event occurred
    ///
    /// # Examples
    ///
    /// ```
    /// # use shedding_stats::survival::KaplanMeierCurve;
    /// // Data: (time, is_censored)
    /// let data = vec![
    ///     (10.0, false), // Event at time 10
    ///     (20.0, true),  // Censored at time 20
    ///     (30.0, false), // Event at time 30
    /// ];
    /// let curve = KaplanMeierCurve::from_data(data);
    /// assert_eq!(curve.points.len(), 3);
    /// assert_eq!(curve.points[0].survival, 1.0);
    /// assert!((curve.points[1].survival - 2.0 / 3.0).abs() < 1e-12);
    /// assert_eq!(curve.points[2].survival, 0.0);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_data(mut data: Vec<(f64, bool)>) -> Self {
        data.sort_by(|(a, _), (b, _)| a.total_cmp(b));

        let subjects = data.len();
        let mut points = vec![SurvivalPoint {
            time: 0.0,
            at_risk: subjects,
            events: 0,
            censored: 0,
            survival: 1.0,
            ci_lower: 1.0,
            ci_upper: 1.0,
        }];

        let mut at_risk = subjects;
        let mut current_survival = 1.0;
        let mut cumulative_var = 0.0;

        let mut i = 0;
        while i < data.len() {
            let current_time = data[i].0;

            // Count events and censorings sharing this time point
            let mut events = 0;
            let mut censored = 0;
            let mut j = i;
            while j < data.len() && data[j].0.total_cmp(&current_time).is_eq() {
                if data[j].1 {
                    censored += 1;
                } else {
                    events += 1;
                }
                j += 1;
            }

            if events > 0 && at_risk > 0 {
                let n = at_risk as f64;
                let d = events as f64;
                current_survival *= 1.0 - d / n;

                if at_risk > events {
                    cumulative_var += d / (n * (n - d));
                }

                let se = if cumulative_var > 0.0 {
                    current_survival * cumulative_var.sqrt()
                } else {
                    0.0
                };

                points.push(SurvivalPoint {
                    time: current_time,
                    at_risk,
                    events,
                    censored,
                    survival: current_survival,
                    ci_lower: (current_survival - Self::Z * se).max(0.0),
                    ci_upper: (current_survival + Self::Z * se).min(1.0),
                });
            }

            at_risk -= events + censored;
            i = j;
        }

        Self { subjects, points }
    }

    /// Returns the first point at which survival drops to or below 50%.
    ///
    /// The median survival time is this point's time and its confidence band
    /// is reported as the band of the median. Returns `None` if survival
    /// never reaches 50%.
    ///
    /// # Examples
    ///
    /// ```
    /// # use shedding_stats::survival::KaplanMeierCurve;
    /// let data = vec![(10.0, false), (20.0, false), (30.0, false)];
    /// let curve = KaplanMeierCurve::from_data(data);
    /// assert_eq!(curve.median_survival(), Some(20.0));
    ///
    /// let censored = KaplanMeierCurve::from_data(vec![(5.0, true), (6.0, true)]);
    /// assert_eq!(censored.median_survival(), None);
    /// ```
    #[must_use]
    pub fn median_point(&self) -> Option<&SurvivalPoint> {
        self.points.iter().find(|p| p.survival <= 0.5)
    }

    /// Returns the median survival time.
    ///
    /// See [`Self::median_point`].
    #[must_use]
    pub fn median_survival(&self) -> Option<f64> {
        self.median_point().map(|p| p.time)
    }

    /// Returns the step of the survival function in effect at `time`.
    ///
    /// This is the last point at or before `time`, or `None` if `time` is
    /// before the time-0 point.
    ///
    /// # Examples
    ///
    /// ```
    /// # use shedding_stats::survival::KaplanMeierCurve;
    /// let data = vec![(10.0, false), (20.0, false)];
    /// let curve = KaplanMeierCurve::from_data(data);
    ///
    /// assert_eq!(curve.point_at(5.0).unwrap().survival, 1.0);  // Before first event
    /// assert_eq!(curve.point_at(15.0).unwrap().survival, 0.5); // After first event
    /// assert!(curve.point_at(-1.0).is_none());
    /// ```
    #[must_use]
    pub fn point_at(&self, time: f64) -> Option<&SurvivalPoint> {
        self.points.iter().rev().find(|p| p.time <= time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let curve = KaplanMeierCurve::from_data(vec![]);
        assert_eq!(curve.subjects, 0);
        assert_eq!(curve.points.len(), 1);
        assert_eq!(curve.median_survival(), None);
    }

    #[test]
    fn test_all_censored() {
        let curve = KaplanMeierCurve::from_data(vec![(3.0, true), (4.0, true), (4.0, true)]);
        assert_eq!(curve.points.len(), 1);
        assert!(curve.points.iter().all(|p| p.events == 0));
        assert_eq!(curve.median_survival(), None);
    }

    #[test]
    fn test_ties_processed_as_cohort() {
        // At t=2: 2 events and 1 censoring among 4 at risk.
        let curve = KaplanMeierCurve::from_data(vec![
            (2.0, false),
            (2.0, true),
            (2.0, false),
            (5.0, false),
        ]);
        assert_eq!(curve.points.len(), 3);
        let p = curve.points[1];
        assert_eq!(p.at_risk, 4);
        assert_eq!(p.events, 2);
        assert_eq!(p.censored, 1);
        assert_eq!(p.survival, 0.5);
        let last = curve.points[2];
        assert_eq!(last.at_risk, 1);
        assert_eq!(last.survival, 0.0);
        assert_eq!(curve.median_survival(), Some(2.0));
    }

    #[test]
    fn test_greenwood_band() {
        let curve = KaplanMeierCurve::from_data(vec![
            (1.0, false),
            (2.0, true),
            (3.0, false),
            (4.0, false),
        ]);
        // t=1: S = 3/4, Var = 1/(4*3)
        let p = curve.points[1];
        assert!((p.survival - 0.75).abs() < 1e-12);
        let se = 0.75 * (1.0_f64 / 12.0).sqrt();
        assert!((p.ci_lower - (0.75 - 1.96 * se)).abs() < 1e-12);
        assert!((p.ci_upper - (0.75 + 1.96 * se).min(1.0)).abs() < 1e-12);
        // t=3: n=2, d=1 -> S = 0.375, Var = 1/12 + 1/2
        let p = curve.points[2];
        assert_eq!(p.at_risk, 2);
        assert!((p.survival - 0.375).abs() < 1e-12);
        assert_eq!(curve.median_survival(), Some(3.0));
    }

    #[test]
    fn test_monotone_non_increasing() {
        let data = vec![
            (1.0, false),
            (1.5, true),
            (2.0, false),
            (2.0, false),
            (3.0, true),
            (4.0, false),
            (7.0, false),
        ];
        let curve = KaplanMeierCurve::from_data(data);
        assert!(curve.points.windows(2).all(|w| w[1].survival <= w[0].survival));
        assert!(
            curve
                .points
                .iter()
                .all(|p| p.ci_lower <= p.survival && p.survival <= p.ci_upper)
        );
    }

    #[test]
    fn test_point_at_step_function() {
        let curve = KaplanMeierCurve::from_data(vec![(2.0, false), (4.0, false)]);
        let survival_at = |t| curve.point_at(t).map(|p| p.survival);
        assert_eq!(survival_at(-1.0), None);
        assert_eq!(survival_at(1.9), Some(1.0));
        assert_eq!(survival_at(2.0), Some(0.5));
        assert_eq!(survival_at(100.0), Some(0.0));
    }
}
