//! Finite difference methods for numerical differentiation.
//!
//! This module provides forward-difference Jacobians of least-squares
//! problems, with and without box constraints on the parameters.

use crate::error::{AsymFitError, Result};
use crate::problem::Problem;
use ndarray::{Array1, Array2};

/// Default step size for finite differences.
pub const DEFAULT_EPSILON: f64 = 1.5e-8;

fn step_size(param: f64, eps: f64) -> f64 {
    if param.abs() > 1.0 {
        param.abs() * eps
    } else {
        eps
    }
}

fn check_residuals(problem: &dyn Problem, residuals: &Array1<f64>) -> Result<()> {
    if residuals.len() != problem.residual_count() {
        return Err(AsymFitError::DimensionMismatch(format!(
            "Expected {} residuals, got {}",
            problem.residual_count(),
            residuals.len()
        )));
    }
    Ok(())
}

/// Compute the Jacobian matrix using forward finite differences.
///
/// The Jacobian is the matrix of partial derivatives of the residuals with
/// respect to the parameters: J[i,j] = ∂residual[i]/∂param[j].
///
/// # Arguments
///
/// * `problem` - The problem to evaluate
/// * `params` - The parameter values at which to evaluate the Jacobian
/// * `epsilon` - The relative step size (optional)
pub fn jacobian(
    problem: &dyn Problem,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let residuals = problem.eval(params)?;
    check_residuals(problem, &residuals)?;

    let mut jac = Array2::zeros((residuals.len(), params.len()));
    for j in 0..params.len() {
        let h = step_size(params[j], eps);
        let mut perturbed = params.clone();
        perturbed[j] += h;

        let shifted = problem.eval(&perturbed)?;
        let column = (&shifted - &residuals) / h;
        jac.column_mut(j).assign(&column);
    }

    Ok(jac)
}

/// Forward-difference Jacobian that never evaluates outside `[lower, upper]`.
///
/// A parameter sitting too close to its upper bound is stepped downwards
/// instead. If neither direction fits (a degenerate interval), its column is
/// zero.
pub fn jacobian_within_bounds(
    problem: &dyn Problem,
    params: &Array1<f64>,
    lower: &Array1<f64>,
    upper: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    if lower.len() != params.len() || upper.len() != params.len() {
        return Err(AsymFitError::DimensionMismatch(format!(
            "Expected {} bounds, got {} lower and {} upper",
            params.len(),
            lower.len(),
            upper.len()
        )));
    }

    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let residuals = problem.eval(params)?;
    check_residuals(problem, &residuals)?;

    let mut jac = Array2::zeros((residuals.len(), params.len()));
    for j in 0..params.len() {
        let magnitude = step_size(params[j], eps);
        let h = if params[j] + magnitude <= upper[j] {
            magnitude
        } else if params[j] - magnitude >= lower[j] {
            -magnitude
        } else {
            continue;
        };

        let mut perturbed = params.clone();
        perturbed[j] += h;

        let shifted = problem.eval(&perturbed)?;
        let column = (&shifted - &residuals) / h;
        jac.column_mut(j).assign(&column);
    }

    Ok(jac)
}
