//! Fixed-width binning centered on multiples of the bin size
//!
//! Longitudinal measurements are reported on a day axis relative to a
//! reference event. To aggregate them, the axis is cut into bins whose
//! centers are multiples of the bin size, so with a bin size of 1 day the
//! centers are the integer days and bin `d` collects times in `(d - 0.5, d + 0.5]`.
//!
//! # Bin Layout
//!
//! ```text
//!   center:      c0          c1          c2
//!   edges:  |-----x-----|-----x-----|-----x-----|
//!          c0-w/2     c0+w/2     c1+w/2     c2+w/2
//! ```
//!
//! Bins are right-closed, except the first bin which also includes its lower
//! edge, so every time inside the covered span lands in exactly one bin.
//!
//! # Examples
//!
//! ```
//! use shedding_stats::binning::CenteredBins;
//!
//! let bins = CenteredBins::covering(0.2, 6.9, 7.0).unwrap();
//! assert_eq!(bins.len(), 2);
//! assert_eq!(bins.bin_of(3.5), Some(0));
//! assert_eq!(bins.bin_of(3.6), Some(1));
//! assert_eq!(bins.center(1), 7.0);
//! ```

use std::collections::BTreeMap;

/// A contiguous run of fixed-width bins centered on multiples of the bin size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenteredBins {
    first_center: f64,
    bin_size: f64,
    len: usize,
}

impl CenteredBins {
    /// Creates the smallest run of bins whose centers span `[min, max]`.
    ///
    /// The first center is `min` rounded down to a multiple of `bin_size` and
    /// the last center is `max` rounded up.
    ///
    /// Returns `None` if `bin_size` is not a positive finite number, if either
    /// bound is not finite, if `min > max`, or if the span holds more bins than
    /// a `usize` can count.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    #[must_use]
    pub fn covering(min: f64, max: f64, bin_size: f64) -> Option<Self> {
        if !(bin_size.is_finite() && bin_size > 0.0) || !min.is_finite() || !max.is_finite() {
            return None;
        }
        if min > max {
            return None;
        }

        let first_center = (min / bin_size).floor() * bin_size;
        let last_center = (max / bin_size).ceil() * bin_size;
        let span = ((last_center - first_center) / bin_size).round();
        if span.is_nan() || span >= usize::MAX as f64 {
            return None;
        }
        let len = (span as usize).checked_add(1)?;

        Some(Self {
            first_center,
            bin_size,
            len,
        })
    }

    /// Number of bins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if there are no bins. A constructed run always has at least one.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Center of bin `index`.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn center(&self, index: usize) -> f64 {
        self.first_center + index as f64 * self.bin_size
    }

    /// Lower edge of the first bin.
    #[must_use]
    pub fn lower_edge(&self) -> f64 {
        self.first_center - self.bin_size / 2.0
    }

    /// Upper edge of the last bin.
    #[must_use]
    pub fn upper_edge(&self) -> f64 {
        self.center(self.len - 1) + self.bin_size / 2.0
    }

    /// Index of the bin containing `time`, or `None` if it falls outside the run.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn bin_of(&self, time: f64) -> Option<usize> {
        let lower = self.lower_edge();
        if !time.is_finite() || time < lower || time > self.upper_edge() {
            return None;
        }
        let index = ((time - lower) / self.bin_size).ceil() - 1.0;
        let index = index.max(0.0) as usize;
        (index < self.len).then_some(index)
    }

    /// Groups items into bins by the time returned from `time_of`.
    ///
    /// Only non-empty bins appear in the result, keyed by bin index so
    /// iteration runs in ascending time order.
    pub fn group_by<'a, T, F>(&self, items: &'a [T], mut time_of: F) -> BTreeMap<usize, Vec<&'a T>>
    where
        F: FnMut(&T) -> f64,
    {
        let mut groups: BTreeMap<usize, Vec<&T>> = BTreeMap::new();
        for item in items {
            if let Some(index) = self.bin_of(time_of(item)) {
                groups.entry(index).or_default().push(item);
            }
        }
        groups
    }
}
