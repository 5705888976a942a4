//! # Uncertainty Calculation
//!
//! Standard uncertainties of fitted parameters, from the Jacobian at the
//! solution scaled by how well the model describes the data:
//!
//! - `w = 1 / errors^2`
//! - `rw = sqrt(sum(res^2) / sum(data^2 w))` (weighted profile R-factor)
//! - `r_exp = sqrt((n - p + c) / sum(data^2 w))` (expected R-factor), where
//!   `n` counts the points with a finite, positive weight
//! - `cov = inv(J^T J) * rw^2 / r_exp^2`
//!
//! `rw^2 / r_exp^2` is the chi-square per degree of freedom.

mod covariance;

pub use covariance::{calculate_correlation, calculate_covariance, standard_errors_from_covariance};

use ndarray::{Array1, Array2};

use crate::error::{AsymFitError, Result};
use crate::lm::LmResult;

/// Parameter uncertainties of one solution.
#[derive(Debug, Clone)]
pub struct UncertaintyEstimate {
    /// Standard uncertainty of each parameter, in solution order
    pub std_errors: Array1<f64>,
    /// Chi-square per degree of freedom
    pub chi_square: f64,
    /// Covariance matrix of the parameters
    pub covariance: Array2<f64>,
    /// Correlation matrix derived from the covariance
    pub correlation: Array2<f64>,
}

/// Estimate parameter uncertainties for an optimizer solution.
///
/// # Arguments
///
/// * `solution` - Optimizer result carrying residuals and a Jacobian
/// * `data` - The data the fit was performed against
/// * `errors` - Experimental uncertainties on the data (ones when `None`)
/// * `num_constraints` - Number of constraints used in the model
///
/// # Errors
///
/// * [`AsymFitError::DimensionMismatch`] when `data`, `errors`, the residuals
///   or the Jacobian disagree in length
/// * [`AsymFitError::Fit`] when the solution has no Jacobian, there are no
///   degrees of freedom left, or the data has no weight
/// * [`AsymFitError::SingularCovariance`] when `J^T J` cannot be inverted
///
/// # Examples
///
/// ```
/// use asymfit_rs::lm::LmResult;
/// use asymfit_rs::uncertainty::estimate_uncertainty;
/// use ndarray::{array, Array2};
///
/// // y = a * x fitted exactly to three points
/// let solution = LmResult {
///     params: array![2.0],
///     residuals: array![0.0, 0.0, 0.0],
///     cost: 0.0,
///     iterations: 3,
///     func_evals: 8,
///     success: true,
///     message: String::new(),
///     jacobian: Some(Array2::from_shape_vec((3, 1), vec![1.0, 2.0, 3.0]).unwrap()),
/// };
///
/// let estimate = estimate_uncertainty(&solution, &array![2.0, 4.0, 6.0], None, 0).unwrap();
/// assert_eq!(estimate.chi_square, 0.0);
/// assert_eq!(estimate.std_errors[0], 0.0);
/// ```
pub fn estimate_uncertainty(
    solution: &LmResult,
    data: &Array1<f64>,
    errors: Option<&Array1<f64>>,
    num_constraints: usize,
) -> Result<UncertaintyEstimate> {
    let n = data.len();
    let weights = match errors {
        Some(errors) if errors.len() != n => {
            return Err(AsymFitError::DimensionMismatch(format!(
                "{} data points but {} uncertainties",
                n,
                errors.len()
            )))
        }
        Some(errors) => errors.mapv(|e| 1.0 / (e * e)),
        None => Array1::ones(n),
    };
    if solution.residuals.len() != n {
        return Err(AsymFitError::DimensionMismatch(format!(
            "{} data points but {} residuals",
            n,
            solution.residuals.len()
        )));
    }

    let jacobian = solution
        .jacobian
        .as_ref()
        .ok_or_else(|| AsymFitError::Fit("solution carries no Jacobian".to_string()))?;
    let num_params = solution.params.len();
    if jacobian.shape() != [n, num_params] {
        return Err(AsymFitError::DimensionMismatch(format!(
            "Jacobian is {:?}, expected [{}, {}]",
            jacobian.shape(),
            n,
            num_params
        )));
    }

    // Points without a finite positive weight do not enter the fit
    let weighted_points = weights.iter().filter(|w| w.is_finite() && **w > 0.0).count();
    let dof = (weighted_points + num_constraints) as i64 - num_params as i64;
    if dof <= 0 {
        return Err(AsymFitError::Fit(format!(
            "no degrees of freedom: {} weighted points, {} parameters, {} constraints",
            weighted_points, num_params, num_constraints
        )));
    }

    let weighted_norm = (data * data * &weights).sum();
    if !(weighted_norm.is_finite() && weighted_norm > 0.0) {
        return Err(AsymFitError::Fit(
            "data has no finite weighted norm".to_string(),
        ));
    }

    let rw = (solution.residuals.mapv(|r| r * r).sum() / weighted_norm).sqrt();
    let r_exp = (dof as f64 / weighted_norm).sqrt();
    let chi_square = rw.powi(2) / r_exp.powi(2);

    let covariance = calculate_covariance(jacobian, chi_square)?;
    Ok(UncertaintyEstimate {
        std_errors: standard_errors_from_covariance(&covariance),
        chi_square,
        correlation: calculate_correlation(&covariance),
        covariance,
    })
}
