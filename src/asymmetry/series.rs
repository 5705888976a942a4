//! Asymmetry time series.

use ndarray::Array1;

use crate::error::{AsymFitError, Result};

/// Ordered (time, value, uncertainty) samples with a fixed bin width.
///
/// Times are in microseconds and increase monotonically. The uncertainty is
/// absent only for series produced by interactive rebinning. A series is
/// never resized in place; rebinning and windowing produce new series.
#[derive(Debug, Clone, PartialEq)]
pub struct AsymmetrySeries {
    time: Array1<f64>,
    values: Array1<f64>,
    uncertainty: Option<Array1<f64>>,
    bin_width_ns: f64,
}

impl AsymmetrySeries {
    pub fn new(
        time: Array1<f64>,
        values: Array1<f64>,
        uncertainty: Option<Array1<f64>>,
        bin_width_ns: f64,
    ) -> Result<Self> {
        if time.len() != values.len() {
            return Err(AsymFitError::DimensionMismatch(format!(
                "time has {} samples but asymmetry has {}",
                time.len(),
                values.len()
            )));
        }
        if let Some(sigma) = &uncertainty {
            if sigma.len() != values.len() {
                return Err(AsymFitError::DimensionMismatch(format!(
                    "uncertainty has {} samples but asymmetry has {}",
                    sigma.len(),
                    values.len()
                )));
            }
        }
        if !(bin_width_ns.is_finite() && bin_width_ns > 0.0) {
            return Err(AsymFitError::InvalidRange(format!(
                "bin width must be positive, got {} ns",
                bin_width_ns
            )));
        }

        Ok(Self {
            time,
            values,
            uncertainty,
            bin_width_ns,
        })
    }

    /// Build a series on the regular grid `start + i * bin_width`.
    pub fn from_values(
        start_us: f64,
        bin_width_ns: f64,
        values: Array1<f64>,
        uncertainty: Option<Array1<f64>>,
    ) -> Result<Self> {
        let width_us = bin_width_ns / 1000.0;
        let time = Array1::from_shape_fn(values.len(), |i| start_us + i as f64 * width_us);
        Self::new(time, values, uncertainty, bin_width_ns)
    }

    pub fn time(&self) -> &Array1<f64> {
        &self.time
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn uncertainty(&self) -> Option<&Array1<f64>> {
        self.uncertainty.as_ref()
    }

    pub fn bin_width_ns(&self) -> f64 {
        self.bin_width_ns
    }

    pub fn bin_width_us(&self) -> f64 {
        self.bin_width_ns / 1000.0
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Time of the first sample
    pub fn start_time(&self) -> Option<f64> {
        self.time.first().copied()
    }

    /// Samples with `begin <= time < end`.
    pub fn window(&self, begin: f64, end: f64) -> Result<AsymmetrySeries> {
        if !(begin < end) {
            return Err(AsymFitError::InvalidRange(format!(
                "time window [{}, {}) is empty",
                begin, end
            )));
        }

        let keep: Vec<usize> = self
            .time
            .iter()
            .enumerate()
            .filter(|(_, t)| **t >= begin && **t < end)
            .map(|(i, _)| i)
            .collect();
        if keep.is_empty() {
            return Err(AsymFitError::EmptyDataset(format!(
                "no samples in time window [{}, {})",
                begin, end
            )));
        }

        let pick = |array: &Array1<f64>| keep.iter().map(|&i| array[i]).collect::<Array1<f64>>();
        AsymmetrySeries::new(
            pick(&self.time),
            pick(&self.values),
            self.uncertainty.as_ref().map(pick),
            self.bin_width_ns,
        )
    }
}
