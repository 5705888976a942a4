//! Tests for parameter uncertainties of optimizer solutions.

use crate::test_helpers::decay_series;
use approx::assert_relative_eq;
use asymfit_rs::fit::{FitEngine, FitSpecification};
use asymfit_rs::lm::{LevenbergMarquardt, LmResult};
use asymfit_rs::parameters::FitVariable;
use asymfit_rs::uncertainty::estimate_uncertainty;
use asymfit_rs::{AsymFitError, Problem, Result};
use ndarray::{array, Array1, Array2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// Weighted straight line `(y - (m x + b)) / sigma` with an analytic Jacobian.
struct WeightedLine {
    x: Array1<f64>,
    y: Array1<f64>,
    sigma: f64,
}

impl WeightedLine {
    fn noisy(n: usize, sigma: f64, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let noise = Normal::new(0.0, sigma).unwrap();
        let x = Array1::linspace(0.0, 10.0, n);
        let y = x.mapv(|x| 2.0 * x + 1.0 + noise.sample(&mut rng));
        Self { x, y, sigma }
    }
}

impl Problem for WeightedLine {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let model = self.x.mapv(|x| params[0] * x + params[1]);
        Ok((&self.y - &model) / self.sigma)
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        self.x.len()
    }

    fn jacobian(&self, _params: &Array1<f64>) -> Result<Array2<f64>> {
        let n = self.x.len();
        let mut jac = Array2::zeros((n, 2));
        for i in 0..n {
            jac[[i, 0]] = -self.x[i] / self.sigma;
            jac[[i, 1]] = -1.0 / self.sigma;
        }
        Ok(jac)
    }

    fn has_custom_jacobian(&self) -> bool {
        true
    }
}

fn solve_line(problem: &WeightedLine) -> LmResult {
    LevenbergMarquardt::new()
        .with_calc_jacobian(true)
        .minimize(problem, array![1.0, 0.0])
        .unwrap()
}

#[test]
fn test_linear_covariance_matches_closed_form() {
    let problem = WeightedLine::noisy(50, 0.5, 42);
    let solution = solve_line(&problem);
    let estimate = estimate_uncertainty(&solution, &(&problem.y / problem.sigma), None, 0).unwrap();

    let n = problem.x.len() as f64;
    let sx = problem.x.sum();
    let sxx = problem.x.mapv(|x| x * x).sum();
    let det = n * sxx - sx * sx;
    let chi_square = solution.residuals.mapv(|r| r * r).sum() / (n - 2.0);
    let scale = problem.sigma.powi(2) * chi_square / det;

    assert_relative_eq!(estimate.chi_square, chi_square, max_relative = 1e-10);
    assert_relative_eq!(estimate.covariance[[0, 0]], n * scale, max_relative = 1e-8);
    assert_relative_eq!(estimate.covariance[[1, 1]], sxx * scale, max_relative = 1e-8);
    assert_relative_eq!(estimate.covariance[[0, 1]], -sx * scale, max_relative = 1e-8);
    assert_relative_eq!(
        estimate.correlation[[0, 1]],
        -sx / (n * sxx).sqrt(),
        max_relative = 1e-8
    );

    // Slope and intercept within a few standard errors of the truth
    assert!((solution.params[0] - 2.0).abs() < 4.0 * estimate.std_errors[0]);
    assert!((solution.params[1] - 1.0).abs() < 4.0 * estimate.std_errors[1]);
}

#[test]
fn test_constraints_add_degrees_of_freedom() {
    let problem = WeightedLine::noisy(20, 0.5, 3);
    let solution = solve_line(&problem);
    let data = &problem.y / problem.sigma;

    let plain = estimate_uncertainty(&solution, &data, None, 0).unwrap();
    let constrained = estimate_uncertainty(&solution, &data, None, 2).unwrap();
    assert_relative_eq!(
        constrained.chi_square,
        plain.chi_square * 18.0 / 20.0,
        max_relative = 1e-12
    );
}

#[test]
fn test_perfect_fit_has_no_uncertainty() {
    let series = decay_series(0.2, 0.1, 200, 50.0, 0.01);
    let spec = FitSpecification::new("f(t)=A0*exp(-lambda*t)")
        .unwrap()
        .with_variable(FitVariable::with_bounds("A0", 0.5, 0.0, 1.0))
        .with_variable(FitVariable::with_bounds("lambda", 0.5, 0.0, 1.0))
        .with_dataset("68011", series.clone());

    let result = FitEngine::new().fit(&spec).unwrap();
    let estimate = result.fits()[0].estimate_uncertainty(&series).unwrap();

    assert!(estimate.chi_square < 1e-8);
    assert!(estimate.std_errors.iter().all(|&e| e < 1e-4));
}

#[test]
fn test_degenerate_solutions_are_reported() {
    let mut solution = LmResult {
        params: array![1.0, 1.0],
        residuals: array![0.1, -0.1, 0.1],
        cost: 0.03,
        iterations: 1,
        func_evals: 4,
        success: true,
        message: String::new(),
        jacobian: Some(array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0]]),
    };
    let data = array![1.0, 2.0, 3.0];

    assert!(matches!(
        estimate_uncertainty(&solution, &data, None, 0),
        Err(AsymFitError::SingularCovariance)
    ));
    assert!(matches!(
        estimate_uncertainty(&solution, &data, Some(&array![1.0, 1.0]), 0),
        Err(AsymFitError::DimensionMismatch(_))
    ));

    solution.jacobian = None;
    assert!(matches!(
        estimate_uncertainty(&solution, &data, None, 0),
        Err(AsymFitError::Fit(_))
    ));
}
