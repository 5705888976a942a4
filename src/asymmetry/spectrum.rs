//! Frequency-domain view of an asymmetry series.

use ndarray::Array1;
use rustfft::{num_complex::Complex, FftPlanner};

use super::series::AsymmetrySeries;
use super::spline::CubicSpline;
use crate::error::{AsymFitError, Result};

/// Number of samples in the display curve produced by [`Spectrum::smoothed`].
pub const DEFAULT_SMOOTHED_POINTS: usize = 300;

/// Magnitude spectrum with frequencies in MHz
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    frequencies: Array1<f64>,
    magnitudes: Array1<f64>,
}

impl Spectrum {
    pub fn frequencies(&self) -> &Array1<f64> {
        &self.frequencies
    }

    pub fn magnitudes(&self) -> &Array1<f64> {
        &self.magnitudes
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Display curve: an interpolating cubic spline through the spectrum,
    /// sampled at `points` evenly spaced frequencies. A single-bin spectrum is
    /// returned unchanged.
    pub fn smoothed(&self, points: usize) -> Result<Spectrum> {
        if self.len() < 2 {
            return Ok(self.clone());
        }

        let x = self.frequencies.to_vec();
        let y = self.magnitudes.to_vec();
        let spline = CubicSpline::new(&x, &y)?;

        let frequencies = Array1::linspace(x[0], x[x.len() - 1], points);
        let magnitudes = frequencies.mapv(|f| spline.eval(f));
        Ok(Spectrum {
            frequencies,
            magnitudes,
        })
    }
}

/// Discrete Fourier transform of the series values.
///
/// Keeps the first `n/2` bins with magnitude `|X_k| / n` at frequency
/// `k * 1000 / (n * bin_ns)` MHz, and zeroes the DC bin.
///
/// # Examples
///
/// ```
/// use asymfit_rs::asymmetry::{spectral_transform, AsymmetrySeries};
/// use ndarray::Array1;
///
/// // 2 MHz cosine sampled every 10 ns
/// let n = 500;
/// let values = Array1::from_shape_fn(n, |i| (2.0 * std::f64::consts::PI * 2.0 * i as f64 * 0.01).cos());
/// let series = AsymmetrySeries::from_values(0.0, 10.0, values, None).unwrap();
///
/// let spectrum = spectral_transform(&series).unwrap();
/// let peak = spectrum
///     .magnitudes()
///     .iter()
///     .enumerate()
///     .fold((0, 0.0), |best, (i, &m)| if m > best.1 { (i, m) } else { best })
///     .0;
/// assert!((spectrum.frequencies()[peak] - 2.0).abs() < 1e-9);
/// ```
pub fn spectral_transform(series: &AsymmetrySeries) -> Result<Spectrum> {
    let n = series.len();
    if n < 2 {
        return Err(AsymFitError::EmptyDataset(format!(
            "spectral transform needs at least 2 samples, got {}",
            n
        )));
    }

    let mut buffer: Vec<Complex<f64>> = series
        .values()
        .iter()
        .map(|&v| Complex::new(v, 0.0))
        .collect();
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let half = n / 2;
    let scale = 1000.0 / (n as f64 * series.bin_width_ns());
    let frequencies = Array1::from_shape_fn(half, |k| k as f64 * scale);
    let mut magnitudes = Array1::from_shape_fn(half, |k| buffer[k].norm() / n as f64);
    magnitudes[0] = 0.0;

    Ok(Spectrum {
        frequencies,
        magnitudes,
    })
}
