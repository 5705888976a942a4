//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! This module contains the core implementation of the Levenberg-Marquardt
//! algorithm for nonlinear least-squares optimization, and its bounded
//! variant built on [`BoundedProblem`].

use log::{debug, trace};
use ndarray::{Array1, Array2};
use std::fmt;

use crate::error::{AsymFitError, Result};
use crate::problem::Problem;
use crate::utils::finite_difference;

use super::bounded::BoundedProblem;
use super::config::LmConfig;
use super::convergence::{ConvergenceCriteria, ConvergenceStatus};
use super::step::LmStep;
use super::trust_region::TrustRegion;

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of iterations performed
    pub iterations: usize,

    /// Number of function evaluations
    pub func_evals: usize,

    /// Whether the optimization succeeded
    pub success: bool,

    /// A message describing the result
    pub message: String,

    /// The Jacobian matrix at the solution (if requested)
    pub jacobian: Option<Array2<f64>>,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

/// Outcome of the inner damping loop.
enum Attempt {
    Accepted {
        params: Array1<f64>,
        residuals: Array1<f64>,
        cost: f64,
    },
    Stopped(ConvergenceStatus),
}

fn sum_of_squares(residuals: &Array1<f64>) -> f64 {
    residuals.iter().map(|r| r.powi(2)).sum()
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    /// Configuration options
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the tolerance for relative change in cost.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    /// Set the tolerance for relative change in parameters.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    /// Set the tolerance for the gradient norm.
    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.config.gtol = gtol;
        self
    }

    /// Set the initial damping parameter.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.config.initial_lambda = lambda;
        self
    }

    pub fn with_lambda_up_factor(mut self, factor: f64) -> Self {
        self.config.lambda_up_factor = factor;
        self
    }

    pub fn with_lambda_down_factor(mut self, factor: f64) -> Self {
        self.config.lambda_down_factor = factor;
        self
    }

    pub fn with_min_lambda(mut self, min_lambda: f64) -> Self {
        self.config.min_lambda = min_lambda;
        self
    }

    pub fn with_max_lambda(mut self, max_lambda: f64) -> Self {
        self.config.max_lambda = max_lambda;
        self
    }

    /// Set the relative step used for numerical Jacobians.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    /// Whether `minimize` returns the Jacobian at the solution.
    pub fn with_calc_jacobian(mut self, calc_jacobian: bool) -> Self {
        self.config.calc_jacobian = calc_jacobian;
        self
    }

    fn jacobian<P: Problem>(&self, problem: &P, params: &Array1<f64>) -> Result<Array2<f64>> {
        if problem.has_custom_jacobian() {
            problem.jacobian(params)
        } else {
            finite_difference::jacobian(problem, params, Some(self.config.epsilon))
        }
    }

    /// Minimize the sum of squared residuals for the given problem.
    ///
    /// # Arguments
    ///
    /// * `problem` - The problem to solve
    /// * `initial_params` - Initial guess for the parameter values
    ///
    /// # Errors
    ///
    /// Fails on a parameter count mismatch, a non-finite initial cost, or an
    /// error raised by the problem itself. Running out of iterations is not an
    /// error; it is reported through `success` and `message`.
    pub fn minimize<P: Problem>(&self, problem: &P, initial_params: Array1<f64>) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(AsymFitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let mut params = initial_params;
        let mut residuals = problem.eval(&params)?;
        let mut cost = sum_of_squares(&residuals);
        let mut func_evals = 1;
        if !cost.is_finite() {
            return Err(AsymFitError::FunctionEvaluation(
                "Residuals at the initial parameters are not finite".to_string(),
            ));
        }

        let criteria = ConvergenceCriteria::from_config(&self.config);
        let mut trust_region = TrustRegion::from_config(&self.config);
        let mut iterations = 0;

        let status = loop {
            let jacobian = self.jacobian(problem, &params)?;
            if !problem.has_custom_jacobian() {
                func_evals += n_params + 1;
            }

            let gradient = jacobian.t().dot(&residuals);
            let gradient_norm = gradient.iter().fold(0.0_f64, |m, g| m.max(g.abs()));
            if criteria.gradient_converged(gradient_norm) {
                break ConvergenceStatus::GradientConvergence;
            }
            if iterations >= criteria.max_iterations {
                break ConvergenceStatus::MaxIterationsReached;
            }

            let attempt = loop {
                let step = match LmStep::calculate_step(&jacobian, &residuals, &trust_region) {
                    Ok(step) => step,
                    Err(AsymFitError::LinearAlgebra(_)) => {
                        trust_region.reject();
                        if trust_region.exhausted() {
                            break Attempt::Stopped(ConvergenceStatus::DampingLimitReached);
                        }
                        continue;
                    }
                    Err(e) => return Err(e),
                };

                let new_params = &params + &step.step;
                let new_residuals = problem.eval(&new_params)?;
                func_evals += 1;
                let new_cost = sum_of_squares(&new_residuals);

                let ratio = TrustRegion::gain_ratio(cost, new_cost, step.predicted_reduction);
                if trust_region.update_lambda(ratio) {
                    break Attempt::Accepted {
                        params: new_params,
                        residuals: new_residuals,
                        cost: new_cost,
                    };
                }
                if ConvergenceCriteria::relative_step(&params, &step.step) < criteria.xtol {
                    break Attempt::Stopped(ConvergenceStatus::ParameterConvergence);
                }
                if trust_region.exhausted() {
                    break Attempt::Stopped(ConvergenceStatus::DampingLimitReached);
                }
            };

            match attempt {
                Attempt::Accepted {
                    params: new_params,
                    residuals: new_residuals,
                    cost: new_cost,
                } => {
                    iterations += 1;
                    let status = criteria.check(&params, &new_params, cost, new_cost, iterations);
                    trace!(
                        "iteration {}: cost {:.6e} -> {:.6e}, lambda {:.1e}",
                        iterations,
                        cost,
                        new_cost,
                        trust_region.lambda
                    );

                    params = new_params;
                    residuals = new_residuals;
                    cost = new_cost;
                    if status.is_terminated() {
                        break status;
                    }
                }
                Attempt::Stopped(status) => break status,
            }
        };

        debug!(
            "{} after {} iterations ({} evaluations), cost {:.6e}",
            status.description(),
            iterations,
            func_evals,
            cost
        );

        let jacobian = if self.config.calc_jacobian {
            Some(self.jacobian(problem, &params)?)
        } else {
            None
        };

        Ok(LmResult {
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            success: status.is_converged(),
            message: status.description().to_string(),
            jacobian,
        })
    }

    /// Minimize with every parameter confined to `[lower[j], upper[j]]`.
    ///
    /// The model is never evaluated outside the bounds. The returned
    /// parameters, residuals and Jacobian refer to the external (bounded)
    /// parameters; the Jacobian is always computed.
    ///
    /// # Errors
    ///
    /// [`AsymFitError::Fit`] on a dimension mismatch, inverted bounds, or an
    /// initial value that is non-finite or outside its bounds.
    pub fn minimize_bounded<P: Problem>(
        &self,
        problem: &P,
        initial_params: Array1<f64>,
        lower: &Array1<f64>,
        upper: &Array1<f64>,
    ) -> Result<LmResult> {
        let bounded = BoundedProblem::new(problem, lower, upper)?;
        let internal_start = bounded.to_internal(&initial_params)?;

        let internal = self.clone().with_calc_jacobian(false).minimize(&bounded, internal_start)?;
        let params = bounded.to_external(&internal.params);
        let residuals = problem.eval(&params)?;
        let jacobian = if problem.has_custom_jacobian() {
            problem.jacobian(&params)?
        } else {
            finite_difference::jacobian_within_bounds(
                problem,
                &params,
                lower,
                upper,
                Some(self.config.epsilon),
            )?
        };

        Ok(LmResult {
            cost: sum_of_squares(&residuals),
            params,
            residuals,
            iterations: internal.iterations,
            func_evals: internal.func_evals + 1,
            success: internal.success,
            message: internal.message,
            jacobian: Some(jacobian),
        })
    }
}
