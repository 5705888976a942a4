//! Interpolating natural cubic spline.

use crate::error::{AsymFitError, Result};

/// Cubic spline through every knot with zero curvature at both ends.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    /// Knot x-positions (strictly increasing)
    x: Vec<f64>,
    /// Knot values
    y: Vec<f64>,
    /// Second derivatives at the knots
    curvature: Vec<f64>,
}

impl CubicSpline {
    /// Fit the spline through `(x[i], y[i])`.
    ///
    /// Requires at least two knots, equal lengths, finite values and strictly
    /// increasing `x`.
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self> {
        let n = x.len();
        if n < 2 {
            return Err(AsymFitError::EmptyDataset(
                "spline requires at least 2 knots".to_string(),
            ));
        }
        if y.len() != n {
            return Err(AsymFitError::DimensionMismatch(format!(
                "spline: x has {} knots but y has {}",
                n,
                y.len()
            )));
        }
        if x.iter().chain(y).any(|v| !v.is_finite()) {
            return Err(AsymFitError::InvalidRange(
                "spline knots must be finite".to_string(),
            ));
        }
        if let Some(i) = (1..n).find(|&i| x[i] <= x[i - 1]) {
            return Err(AsymFitError::InvalidRange(format!(
                "spline knots must be strictly increasing, but x[{}]={} >= x[{}]={}",
                i - 1,
                x[i - 1],
                i,
                x[i]
            )));
        }

        let curvature = natural_curvature(x, y);
        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            curvature,
        })
    }

    /// Value at `at`; outside the knot range the end cubic is extended.
    pub fn eval(&self, at: f64) -> f64 {
        let n = self.x.len();
        let i = match self.x.partition_point(|&knot| knot <= at) {
            0 => 0,
            p if p >= n => n - 2,
            p => p - 1,
        };

        let h = self.x[i + 1] - self.x[i];
        let a = (self.x[i + 1] - at) / h;
        let b = (at - self.x[i]) / h;
        a * self.y[i]
            + b * self.y[i + 1]
            + ((a * a * a - a) * self.curvature[i] + (b * b * b - b) * self.curvature[i + 1]) * h * h
                / 6.0
    }
}

/// Second derivatives of the natural spline, by the Thomas algorithm on the
/// tridiagonal system.
fn natural_curvature(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut m = vec![0.0; n];
    if n < 3 {
        return m;
    }

    let mut upper = vec![0.0; n];
    let mut rhs = vec![0.0; n];
    for i in 1..n - 1 {
        let h0 = x[i] - x[i - 1];
        let h1 = x[i + 1] - x[i];
        let diag = 2.0 * (h0 + h1);
        let d = 6.0 * ((y[i + 1] - y[i]) / h1 - (y[i] - y[i - 1]) / h0);

        let denom = diag - h0 * upper[i - 1];
        upper[i] = h1 / denom;
        rhs[i] = (d - h0 * rhs[i - 1]) / denom;
    }

    for i in (1..n - 1).rev() {
        m[i] = rhs[i] - upper[i] * m[i + 1];
    }
    m
}
