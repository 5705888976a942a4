//! Runs: a histogram pair, its metadata and the asymmetry derived from them.

use log::debug;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::histogram::{BinRange, Histogram, HistogramSource};
use super::rebin::{rebin, RebinMode};
use super::series::AsymmetrySeries;
use crate::error::{AsymFitError, Result};

/// Background and good-region windows of one histogram
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramWindows {
    /// Title of the histogram these windows apply to
    pub title: String,
    pub background: BinRange,
    pub good: BinRange,
}

/// Which histogram of the pair a metadata change targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Detector {
    Forward,
    Backward,
}

/// Run-level constants needed to turn a histogram pair into asymmetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub title: String,
    /// Width of one histogram bin in nanoseconds
    pub bin_width_ns: f64,
    /// Bin at which t = 0; may be fractional
    pub time_zero_bin: f64,
    pub forward: HistogramWindows,
    pub backward: HistogramWindows,
}

impl RunMetadata {
    pub fn bin_width_us(&self) -> f64 {
        self.bin_width_ns / 1000.0
    }

    pub fn windows(&self, detector: Detector) -> &HistogramWindows {
        match detector {
            Detector::Forward => &self.forward,
            Detector::Backward => &self.backward,
        }
    }

    fn windows_mut(&mut self, detector: Detector) -> &mut HistogramWindows {
        match detector {
            Detector::Forward => &mut self.forward,
            Detector::Backward => &mut self.backward,
        }
    }

    /// Good region shared by both histograms.
    pub fn good_region(&self) -> Option<BinRange> {
        self.forward.good.intersect(&self.backward.good)
    }

    /// Time (μs) of the start of bin `bin`.
    pub fn bin_time(&self, bin: usize) -> f64 {
        (bin as f64 - self.time_zero_bin) * self.bin_width_us()
    }
}

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Background-corrected asymmetry and counting uncertainty of a histogram
/// pair over the intersection of their good regions.
///
/// `A = ((F - bF) - (B - bB)) / ((F - bF) + (B - bB))` and
/// `σ = sqrt((2F/(F+B)² √B)² + (2B/(F+B)² √F)²)`, with any non-finite value
/// replaced by `0.0`.
pub fn compute_asymmetry(
    forward: &Histogram,
    backward: &Histogram,
    meta: &RunMetadata,
) -> Result<AsymmetrySeries> {
    if !(meta.bin_width_ns.is_finite() && meta.bin_width_ns > 0.0) {
        return Err(AsymFitError::InvalidRange(format!(
            "bin width must be positive, got {} ns",
            meta.bin_width_ns
        )));
    }
    if forward.is_empty() || backward.is_empty() {
        return Err(AsymFitError::EmptyDataset(format!(
            "histogram pair '{}'/'{}' is empty",
            forward.title(),
            backward.title()
        )));
    }

    meta.forward
        .good
        .validate(forward.len(), &format!("good ({})", forward.title()))?;
    meta.backward
        .good
        .validate(backward.len(), &format!("good ({})", backward.title()))?;

    let bkg_forward = forward.background(meta.forward.background)?;
    let bkg_backward = backward.background(meta.backward.background)?;

    let good = meta.good_region().ok_or_else(|| {
        AsymFitError::EmptyDataset(format!(
            "good regions of '{}' and '{}' do not overlap",
            forward.title(),
            backward.title()
        ))
    })?;

    let f = forward.counts();
    let b = backward.counts();
    let n = good.len();

    let values = Array1::from_shape_fn(n, |k| {
        let i = good.start + k;
        let front = f[i] - bkg_forward;
        let back = b[i] - bkg_backward;
        finite_or_zero((front - back) / (front + back))
    });

    let uncertainty = Array1::from_shape_fn(n, |k| {
        let i = good.start + k;
        let (h1, h2) = (f[i], b[i]);
        let d1 = h1.sqrt();
        let d2 = h2.sqrt();
        let total_sq = (h1 + h2).powi(2);
        let term_one = 2.0 * h1 / total_sq * d2;
        let term_two = 2.0 * h2 / total_sq * d1;
        finite_or_zero((term_one.powi(2) + term_two.powi(2)).sqrt())
    });

    let time = Array1::from_shape_fn(n, |k| meta.bin_time(good.start + k));

    debug!(
        "asymmetry for '{}': bins {}..={}, backgrounds {:.4}/{:.4}",
        meta.title, good.start, good.end, bkg_forward, bkg_backward
    );

    AsymmetrySeries::new(time, values, Some(uncertainty), meta.bin_width_ns)
}

/// A run and everything derived from it.
///
/// The full-resolution asymmetry is recomputed whenever background or
/// good-region metadata changes; cached rebinned variants are dropped at the
/// same time. A rejected change leaves the run untouched.
#[derive(Debug, Clone)]
pub struct RunDataset {
    metadata: RunMetadata,
    forward: Histogram,
    backward: Histogram,
    asymmetry: AsymmetrySeries,
    rebinned: Vec<AsymmetrySeries>,
}

impl RunDataset {
    pub fn new(forward: Histogram, backward: Histogram, metadata: RunMetadata) -> Result<Self> {
        let asymmetry = compute_asymmetry(&forward, &backward, &metadata)?;
        Ok(Self {
            metadata,
            forward,
            backward,
            asymmetry,
            rebinned: Vec::new(),
        })
    }

    /// Build a run from the histograms named in `metadata`.
    pub fn from_source<S: HistogramSource + ?Sized>(source: &S, metadata: RunMetadata) -> Result<Self> {
        let lookup = |title: &str| {
            source.histogram(title).cloned().ok_or_else(|| {
                AsymFitError::EmptyDataset(format!("histogram '{}' not found in source", title))
            })
        };
        let forward = lookup(&metadata.forward.title)?;
        let backward = lookup(&metadata.backward.title)?;
        Self::new(forward, backward, metadata)
    }

    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    pub fn forward(&self) -> &Histogram {
        &self.forward
    }

    pub fn backward(&self) -> &Histogram {
        &self.backward
    }

    /// Full-resolution asymmetry
    pub fn asymmetry(&self) -> &AsymmetrySeries {
        &self.asymmetry
    }

    /// Cached rebinned variants, in creation order
    pub fn rebinned(&self) -> &[AsymmetrySeries] {
        &self.rebinned
    }

    /// Cached variant with the given bin width, if any
    pub fn rebinned_at(&self, bin_width_ns: f64) -> Option<&AsymmetrySeries> {
        self.rebinned
            .iter()
            .find(|s| s.bin_width_ns() == bin_width_ns)
    }

    pub fn set_background(&mut self, detector: Detector, window: BinRange) -> Result<()> {
        let mut metadata = self.metadata.clone();
        metadata.windows_mut(detector).background = window;
        self.apply_metadata(metadata)
    }

    pub fn set_good_region(&mut self, detector: Detector, window: BinRange) -> Result<()> {
        let mut metadata = self.metadata.clone();
        metadata.windows_mut(detector).good = window;
        self.apply_metadata(metadata)
    }

    /// Replace the metadata wholesale (e.g. after a time-zero correction).
    pub fn set_metadata(&mut self, metadata: RunMetadata) -> Result<()> {
        self.apply_metadata(metadata)
    }

    fn apply_metadata(&mut self, metadata: RunMetadata) -> Result<()> {
        let asymmetry = compute_asymmetry(&self.forward, &self.backward, &metadata)?;
        self.metadata = metadata;
        self.asymmetry = asymmetry;
        self.rebinned.clear();
        Ok(())
    }

    /// Rebin the full-resolution asymmetry and cache the result, replacing a
    /// cached variant of the same width.
    pub fn rebin(
        &mut self,
        target_bin_width_ns: f64,
        begin: f64,
        end: f64,
        mode: RebinMode,
    ) -> Result<&AsymmetrySeries> {
        let series = rebin(&self.asymmetry, target_bin_width_ns, begin, end, mode)?;
        let slot = match self
            .rebinned
            .iter()
            .position(|s| s.bin_width_ns() == series.bin_width_ns())
        {
            Some(index) => {
                self.rebinned[index] = series;
                index
            }
            None => {
                self.rebinned.push(series);
                self.rebinned.len() - 1
            }
        };
        Ok(&self.rebinned[slot])
    }
}
