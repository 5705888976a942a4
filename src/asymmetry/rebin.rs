//! Rebinning of asymmetry series to a coarser time resolution.

use ndarray::{s, Array1};
use serde::{Deserialize, Serialize};

use super::series::AsymmetrySeries;
use crate::error::{AsymFitError, Result};

/// Slack for ratios of bin widths and times that should be integral.
const RATIO_EPSILON: f64 = 1e-9;

/// How much work a rebin does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RebinMode {
    /// Propagate uncertainties
    #[default]
    Exact,

    /// Skip uncertainty propagation; the output series has none. Meant for
    /// live previews such as a slider being dragged.
    Interactive,
}

fn floor_ratio(x: f64) -> usize {
    let floored = (x + RATIO_EPSILON).floor();
    if floored > 0.0 {
        floored as usize
    } else {
        0
    }
}

/// Average groups of consecutive samples into bins of `target_bin_width_ns`.
///
/// The window `[begin, end)` is in microseconds and must start at or after
/// the first sample. `k = floor(target / source)` samples form each output
/// bin, the first group starts at index `floor((begin - t0) / source)`, and
/// only complete groups are emitted. Output times are `begin + i * target`.
/// Values are group means; uncertainties are `sqrt(Σσ²) / k`.
///
/// # Examples
///
/// ```
/// use asymfit_rs::asymmetry::{rebin, AsymmetrySeries, RebinMode};
/// use ndarray::array;
///
/// let series = AsymmetrySeries::from_values(
///     0.0,
///     100.0,
///     array![0.1, 0.3, 0.5, 0.7],
///     Some(array![0.1, 0.1, 0.1, 0.1]),
/// )
/// .unwrap();
///
/// let coarse = rebin(&series, 200.0, 0.0, 0.4, RebinMode::Exact).unwrap();
/// assert_eq!(coarse.len(), 2);
/// assert!((coarse.values()[0] - 0.2).abs() < 1e-12);
/// ```
pub fn rebin(
    series: &AsymmetrySeries,
    target_bin_width_ns: f64,
    begin: f64,
    end: f64,
    mode: RebinMode,
) -> Result<AsymmetrySeries> {
    let start = series
        .start_time()
        .ok_or_else(|| AsymFitError::EmptyDataset("cannot rebin an empty series".to_string()))?;

    let source_ns = series.bin_width_ns();
    if !(target_bin_width_ns.is_finite() && target_bin_width_ns > 0.0) {
        return Err(AsymFitError::InvalidRange(format!(
            "target bin width must be positive, got {} ns",
            target_bin_width_ns
        )));
    }
    let k = floor_ratio(target_bin_width_ns / source_ns);
    if k == 0 {
        return Err(AsymFitError::InvalidRange(format!(
            "target bin width {} ns is finer than the source width {} ns",
            target_bin_width_ns, source_ns
        )));
    }

    let source_us = series.bin_width_us();
    let target_us = target_bin_width_ns / 1000.0;
    if !(begin.is_finite() && end.is_finite() && begin < end) {
        return Err(AsymFitError::InvalidRange(format!(
            "rebin window [{}, {}) is empty",
            begin, end
        )));
    }
    if begin < start - RATIO_EPSILON * source_us {
        return Err(AsymFitError::InvalidRange(format!(
            "rebin window starts at {} before the first sample at {}",
            begin, start
        )));
    }

    let first = floor_ratio((begin - start) / source_us);
    let requested = floor_ratio((end - begin) / target_us);
    let available = series.len().saturating_sub(first) / k;
    let count = requested.min(available);
    if count == 0 {
        return Err(AsymFitError::EmptyDataset(format!(
            "rebin window [{}, {}) holds no complete {} ns bin",
            begin, end, target_bin_width_ns
        )));
    }

    let values = series.values();
    let binned = Array1::from_shape_fn(count, |i| {
        let lo = first + i * k;
        values.slice(s![lo..lo + k]).sum() / k as f64
    });

    let uncertainty = match (mode, series.uncertainty()) {
        (RebinMode::Exact, Some(sigma)) => Some(Array1::from_shape_fn(count, |i| {
            let lo = first + i * k;
            let sum_sq: f64 = sigma.slice(s![lo..lo + k]).iter().map(|u| u * u).sum();
            sum_sq.sqrt() / k as f64
        })),
        _ => None,
    };

    let time = Array1::from_shape_fn(count, |i| begin + i as f64 * target_us);
    AsymmetrySeries::new(time, binned, uncertainty, target_bin_width_ns)
}
