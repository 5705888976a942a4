//! # Covariance Matrix Calculations
//!
//! This module provides functions for calculating and manipulating covariance
//! matrices from Jacobian matrices in nonlinear least-squares optimization.

use ndarray::{Array1, Array2};

use crate::error::{AsymFitError, Result};
use crate::utils::matrix_convert::{nalgebra_to_ndarray, ndarray_to_nalgebra};

/// Below this estimated reciprocal condition number `J^T J` counts as singular.
const RCOND_LIMIT: f64 = 1e-13;

/// Calculate covariance matrix from Jacobian matrix.
///
/// For nonlinear least-squares problems, the covariance matrix is estimated as:
///   covar = scale * inv(J^T * J)
/// where `scale` is the reduced chi-square of the fit.
///
/// `J^T J` is inverted through its Cholesky factor; a matrix that is not
/// positive definite yields [`AsymFitError::SingularCovariance`].
pub fn calculate_covariance(jacobian: &Array2<f64>, scale: f64) -> Result<Array2<f64>> {
    let jtj = ndarray_to_nalgebra(&jacobian.t().dot(jacobian));
    let cholesky = jtj.cholesky().ok_or(AsymFitError::SingularCovariance)?;

    // Squared ratio of the factor's diagonal extremes bounds 1 / cond(J^T J).
    let factor = cholesky.l();
    let diagonal = factor.diagonal();
    let largest = diagonal.iter().fold(0.0_f64, |m, d| m.max(d.abs()));
    let smallest = diagonal.iter().fold(f64::INFINITY, |m, d| m.min(d.abs()));
    let rcond = (smallest / largest).powi(2);
    if diagonal.is_empty() || !rcond.is_finite() || rcond < RCOND_LIMIT {
        return Err(AsymFitError::SingularCovariance);
    }

    let inverse = cholesky.inverse();
    if inverse.iter().any(|v| !v.is_finite()) {
        return Err(AsymFitError::SingularCovariance);
    }

    Ok(nalgebra_to_ndarray(&inverse) * scale)
}

/// Calculate correlation matrix from covariance matrix.
///
/// The correlation matrix is calculated as:
///   correl[i,j] = covar[i,j] / sqrt(covar[i,i] * covar[j,j])
///
/// Entries whose variances vanish are reported as zero off the diagonal.
pub fn calculate_correlation(covar: &Array2<f64>) -> Array2<f64> {
    let n = covar.nrows();
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            return 1.0;
        }
        let denom = (covar[[i, i]] * covar[[j, j]]).sqrt();
        if denom > 0.0 {
            covar[[i, j]] / denom
        } else {
            0.0
        }
    })
}

/// Extract standard errors from the covariance matrix.
///
/// Standard errors are the square roots of the diagonal elements
/// of the covariance matrix.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Array1<f64> {
    covar.diag().mapv(|v| if v > 0.0 { v.sqrt() } else { 0.0 })
}
