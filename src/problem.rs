//! Least-squares problems.
//!
//! [`Problem`] is the seam between the optimizer and whatever produces
//! residuals. The fit engine implements it for single-run and global
//! asymmetry fits; [`BoundedProblem`](crate::lm::BoundedProblem) wraps any
//! implementation to enforce box constraints.

use crate::error::Result;
use ndarray::{Array1, Array2};

/// Residual vector `r(p)` whose sum of squares the optimizer minimizes.
pub trait Problem {
    /// Residuals at `params`.
    ///
    /// Errors propagate out of the optimizer unchanged.
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// Length of the parameter vector `eval` expects.
    fn parameter_count(&self) -> usize;

    /// Length of the residual vector `eval` returns.
    fn residual_count(&self) -> usize;

    /// `∂r_i/∂p_j` at `params`, one row per residual.
    ///
    /// Defaults to forward differences with the default step.
    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>>
    where
        Self: Sized,
    {
        crate::utils::finite_difference::jacobian(self, params, None)
    }

    /// Whether [`jacobian`](Problem::jacobian) is analytic. When false the
    /// optimizer differentiates numerically with its configured step.
    fn has_custom_jacobian(&self) -> bool {
        false
    }

    /// Sum of squared residuals at `params`.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(residuals.iter().map(|r| r.powi(2)).sum())
    }
}
