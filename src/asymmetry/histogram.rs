//! Detector histograms and the bin windows defined on them.

use ndarray::{s, Array1};
use serde::{Deserialize, Serialize};

use crate::error::{AsymFitError, Result};

/// Inclusive range of bin indices `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BinRange {
    pub start: usize,
    pub end: usize,
}

impl BinRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of bins covered (zero if inverted).
    pub fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overlap of two ranges, or `None` if they are disjoint.
    pub fn intersect(&self, other: &BinRange) -> Option<BinRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(BinRange { start, end })
    }

    /// Check that the range is ordered and fits a histogram of `len` bins.
    pub fn validate(&self, len: usize, what: &str) -> Result<()> {
        if self.start > self.end {
            return Err(AsymFitError::InvalidRange(format!(
                "{} window is inverted: {}..={}",
                what, self.start, self.end
            )));
        }
        if self.end >= len {
            return Err(AsymFitError::InvalidRange(format!(
                "{} window {}..={} exceeds histogram of {} bins",
                what, self.start, self.end, len
            )));
        }
        Ok(())
    }
}

/// Time-binned detector counts. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    title: String,
    counts: Array1<f64>,
}

impl Histogram {
    pub fn new(title: &str, counts: Array1<f64>) -> Self {
        Self {
            title: title.to_string(),
            counts,
        }
    }

    pub fn from_vec(title: &str, counts: Vec<f64>) -> Self {
        Self::new(title, Array1::from_vec(counts))
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn counts(&self) -> &Array1<f64> {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Mean count over the inclusive background `window`.
    ///
    /// # Examples
    ///
    /// ```
    /// use asymfit_rs::asymmetry::{BinRange, Histogram};
    ///
    /// let hist = Histogram::from_vec("Forward", vec![2.0, 4.0, 6.0, 100.0]);
    /// assert_eq!(hist.background(BinRange::new(0, 2)).unwrap(), 4.0);
    /// assert!(hist.background(BinRange::new(2, 4)).is_err());
    /// ```
    pub fn background(&self, window: BinRange) -> Result<f64> {
        if self.is_empty() {
            return Err(AsymFitError::EmptyDataset(format!(
                "histogram '{}' has no bins",
                self.title
            )));
        }
        window.validate(self.len(), &format!("background ({})", self.title))?;

        let slice = self.counts.slice(s![window.start..=window.end]);
        Ok(slice.sum() / window.len() as f64)
    }
}

/// Supplier of histograms by title, typically backed by a file reader.
pub trait HistogramSource {
    fn histogram(&self, title: &str) -> Option<&Histogram>;

    /// Titles of every available histogram, in source order
    fn titles(&self) -> Vec<&str>;
}

/// In-memory collection of histograms.
#[derive(Debug, Clone, Default)]
pub struct HistogramSet {
    histograms: Vec<Histogram>,
}

impl HistogramSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a histogram, replacing any with the same title.
    pub fn insert(&mut self, histogram: Histogram) {
        match self
            .histograms
            .iter_mut()
            .find(|h| h.title == histogram.title)
        {
            Some(existing) => *existing = histogram,
            None => self.histograms.push(histogram),
        }
    }

    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }
}

impl FromIterator<Histogram> for HistogramSet {
    fn from_iter<I: IntoIterator<Item = Histogram>>(iter: I) -> Self {
        let mut set = HistogramSet::new();
        for histogram in iter {
            set.insert(histogram);
        }
        set
    }
}

impl HistogramSource for HistogramSet {
    fn histogram(&self, title: &str) -> Option<&Histogram> {
        self.histograms.iter().find(|h| h.title == title)
    }

    fn titles(&self) -> Vec<&str> {
        self.histograms.iter().map(|h| h.title.as_str()).collect()
    }
}
