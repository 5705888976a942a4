//! Step calculation for the Levenberg-Marquardt algorithm.
//!
//! This module provides functionality for computing the Levenberg-Marquardt step,
//! which combines the Gauss-Newton and gradient descent steps.

use crate::error::{AsymFitError, Result};
use crate::lm::trust_region::TrustRegion;
use crate::utils::matrix_convert::{
    nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra,
};
use ndarray::{Array1, Array2};

/// Result of a Levenberg-Marquardt step calculation.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// The calculated step vector
    pub step: Array1<f64>,

    /// The predicted reduction in cost function value
    pub predicted_reduction: f64,

    /// The damping parameter used to calculate the step
    pub lambda: f64,
}

/// Handles step calculation for the Levenberg-Marquardt algorithm.
pub struct LmStep;

impl LmStep {
    /// Calculates the Levenberg-Marquardt step.
    ///
    /// Solves `(J^T J + lambda * D) step = -J^T r` where `D` is the diagonal
    /// of `J^T J` (floored at 1e-10).
    ///
    /// # Arguments
    ///
    /// * `jacobian` - The Jacobian matrix at the current position
    /// * `residuals` - The residuals at the current position
    /// * `trust_region` - The trust region controller
    pub fn calculate_step(
        jacobian: &Array2<f64>,
        residuals: &Array1<f64>,
        trust_region: &TrustRegion,
    ) -> Result<StepResult> {
        let j_t_j = jacobian.t().dot(jacobian);
        let j_t_r = jacobian.t().dot(residuals);

        let mut augmented_j_t_j = j_t_j;
        for i in 0..augmented_j_t_j.nrows() {
            augmented_j_t_j[[i, i]] += trust_region.lambda * augmented_j_t_j[[i, i]].max(1e-10);
        }

        let step = Self::solve(&augmented_j_t_j, &-&j_t_r)?;
        let predicted_reduction = Self::predicted_reduction(jacobian, residuals, &step);

        Ok(StepResult {
            step,
            predicted_reduction,
            lambda: trust_region.lambda,
        })
    }

    /// Solves the symmetric system `a * x = b`, by Cholesky when `a` is
    /// positive definite and by LU otherwise.
    fn solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
        let a = ndarray_to_nalgebra(a);
        let b = ndarray_vec_to_nalgebra(b);

        let x = match a.clone().cholesky() {
            Some(cholesky) => cholesky.solve(&b),
            None => a.lu().solve(&b).ok_or_else(|| {
                AsymFitError::LinearAlgebra("Linear system solution failed".to_string())
            })?,
        };

        if x.iter().any(|v| !v.is_finite()) {
            return Err(AsymFitError::LinearAlgebra(
                "Linear system solution is not finite".to_string(),
            ));
        }
        Ok(nalgebra_vec_to_ndarray(&x))
    }

    /// Reduction in cost predicted by the linear model: `|r|^2 - |r + J step|^2`.
    fn predicted_reduction(jacobian: &Array2<f64>, residuals: &Array1<f64>, step: &Array1<f64>) -> f64 {
        let linearized = residuals + &jacobian.dot(step);
        residuals.dot(residuals) - linearized.dot(&linearized)
    }
}
