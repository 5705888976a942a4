//! Integration tests for the Levenberg-Marquardt algorithm.

use approx::assert_relative_eq;
use asymfit_rs::lm::{LevenbergMarquardt, LmConfig};
use asymfit_rs::{AsymFitError, Problem, Result};
use ndarray::{array, Array1, Array2};

/// Test Problem: Simple 1D linear function f(x) = a*x + b
struct LinearProblem {
    x_data: Array1<f64>,
    y_data: Array1<f64>,
}

impl Problem for LinearProblem {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        if params.len() != 2 {
            return Err(AsymFitError::DimensionMismatch(format!(
                "Expected 2 parameters, got {}",
                params.len()
            )));
        }
        Ok(&self.x_data * params[0] + params[1] - &self.y_data)
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        self.x_data.len()
    }

    fn jacobian(&self, _params: &Array1<f64>) -> Result<Array2<f64>> {
        let n = self.x_data.len();
        let mut jac = Array2::zeros((n, 2));
        for i in 0..n {
            jac[[i, 0]] = self.x_data[i]; // d/da
            jac[[i, 1]] = 1.0; // d/db
        }
        Ok(jac)
    }

    fn has_custom_jacobian(&self) -> bool {
        true
    }
}

/// Test Problem: Rosenbrock function as residuals `1 - x` and `10 (y - x²)`
struct RosenbrockProblem;

impl Problem for RosenbrockProblem {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let (x, y) = (params[0], params[1]);
        Ok(array![1.0 - x, 10.0 * (y - x.powi(2))])
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        2
    }

    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>> {
        let x = params[0];
        Ok(array![[-1.0, 0.0], [-20.0 * x, 10.0]])
    }

    fn has_custom_jacobian(&self) -> bool {
        true
    }
}

/// Test Problem: Exponential decay, Jacobian by finite differences
struct ExponentialProblem {
    x_data: Array1<f64>,
    y_data: Array1<f64>,
}

impl Problem for ExponentialProblem {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let (a, b) = (params[0], params[1]);
        Ok(self.x_data.mapv(|x| a * (-b * x).exp()) - &self.y_data)
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        self.x_data.len()
    }
}

#[test]
fn test_linear_fitting() {
    let problem = LinearProblem {
        x_data: array![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
        y_data: array![2.1, 4.9, 8.05, 10.8, 14.1, 17.0],
    };

    let result = LevenbergMarquardt::new()
        .minimize(&problem, array![1.0, 1.0])
        .unwrap();

    assert!(result.success);
    assert_relative_eq!(result.params[0], 3.0, epsilon = 0.1);
    assert_relative_eq!(result.params[1], 2.0, epsilon = 0.1);
    assert!(result.cost < 0.1);
}

#[test]
fn test_rosenbrock_optimization() {
    let config = LmConfig {
        max_iterations: 200,
        ..LmConfig::default()
    };
    let result = LevenbergMarquardt::with_config(config)
        .minimize(&RosenbrockProblem, array![-1.2, 1.0])
        .unwrap();

    assert!(result.success, "{}", result);
    assert_relative_eq!(result.params[0], 1.0, epsilon = 1e-4);
    assert_relative_eq!(result.params[1], 1.0, epsilon = 1e-4);
    assert!(result.cost < 1e-8);
}

#[test]
fn test_bounded_rosenbrock_sits_on_the_bound() {
    let result = LevenbergMarquardt::new()
        .minimize_bounded(
            &RosenbrockProblem,
            array![-1.2, 1.0],
            &array![-2.0, -2.0],
            &array![0.5, 2.0],
        )
        .unwrap();

    assert!(result.params[0] <= 0.5);
    assert_relative_eq!(result.params[0], 0.5, epsilon = 1e-3);
    assert_relative_eq!(result.params[1], 0.25, epsilon = 2e-3);
    assert!(result.jacobian.is_some());
}

#[test]
fn test_exponential_fitting() {
    let problem = ExponentialProblem {
        x_data: array![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0],
        y_data: array![2.02, 1.67, 1.21, 0.98, 0.81, 0.62, 0.45, 0.39, 0.29],
    };

    let result = LevenbergMarquardt::new()
        .minimize(&problem, array![1.0, 0.1])
        .unwrap();

    assert!(result.success);
    assert_relative_eq!(result.params[0], 2.0, epsilon = 0.1);
    assert_relative_eq!(result.params[1], 0.5, epsilon = 0.1);
    assert!(result.cost < 0.01);
}

#[test]
fn test_bad_initial_guess() {
    let problem = LinearProblem {
        x_data: array![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
        y_data: array![2.0, 5.0, 8.0, 11.0, 14.0, 17.0],
    };

    let result = LevenbergMarquardt::new()
        .minimize(&problem, array![100.0, -50.0])
        .unwrap();

    assert!(result.success);
    assert_relative_eq!(result.params[0], 3.0, epsilon = 1e-6);
    assert_relative_eq!(result.params[1], 2.0, epsilon = 1e-6);
}

#[test]
fn test_custom_config() {
    let problem = LinearProblem {
        x_data: array![0.0, 1.0, 2.0, 3.0, 4.0],
        y_data: array![1.0, 3.0, 5.0, 7.0, 9.0],
    };
    let config = LmConfig {
        max_iterations: 5,
        ftol: 1e-2,
        xtol: 1e-2,
        gtol: 1e-2,
        initial_lambda: 1.0,
        ..LmConfig::default()
    };

    let result = LevenbergMarquardt::with_config(config)
        .minimize(&problem, array![1.0, 0.0])
        .unwrap();

    assert!(result.iterations <= 5);
    assert_relative_eq!(result.params[0], 2.0, epsilon = 0.2);
    assert_relative_eq!(result.params[1], 1.0, epsilon = 0.2);
}

#[test]
fn test_bounded_guess_outside_bounds_is_rejected() {
    let problem = LinearProblem {
        x_data: array![0.0, 1.0, 2.0],
        y_data: array![1.0, 3.0, 5.0],
    };
    let result = LevenbergMarquardt::new().minimize_bounded(
        &problem,
        array![5.0, 0.0],
        &array![0.0, -1.0],
        &array![4.0, 1.0],
    );
    assert!(matches!(result, Err(AsymFitError::Fit(_))));

    let result = LevenbergMarquardt::new().minimize(&problem, array![1.0]);
    assert!(matches!(result, Err(AsymFitError::DimensionMismatch(_))));
}

#[test]
fn test_bounded_guess_on_lower_bound_moves_away() {
    let problem = ExponentialProblem {
        x_data: array![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0],
        y_data: array![2.02, 1.67, 1.21, 0.98, 0.81, 0.62, 0.45, 0.39, 0.29],
    };

    let result = LevenbergMarquardt::new()
        .minimize_bounded(
            &problem,
            array![0.0, 0.1],
            &array![0.0, 0.0],
            &array![f64::INFINITY, f64::INFINITY],
        )
        .unwrap();

    assert!(result.success, "{}", result);
    assert!(result.iterations > 0);
    assert_relative_eq!(result.params[0], 2.0, epsilon = 0.1);
    assert_relative_eq!(result.params[1], 0.5, epsilon = 0.1);
}
