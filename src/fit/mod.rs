//! # Model Fitting
//!
//! Fits a user model `f(t)` to one or more asymmetry series by bounded
//! weighted least squares.
//!
//! - [`FitSpecification`]: the model, its variables, the runs and the options
//! - [`FitEngine`]: validates a specification and solves it, either run by
//!   run or globally (all runs at once, sharing global variables)
//! - [`FitDataset`] and [`Fit`]: per-run results with an evaluator for the
//!   fitted model
//! - [`FunctionRegistry`]: saved model expressions next to the built-in
//!   relaxation functions
//!
//! ## Example Usage
//!
//! ```rust
//! use asymfit_rs::asymmetry::AsymmetrySeries;
//! use asymfit_rs::fit::{FitEngine, FitOptions, FitSpecification};
//! use asymfit_rs::parameters::FitVariable;
//! use ndarray::Array1;
//!
//! let run = |amplitude: f64| {
//!     AsymmetrySeries::from_values(
//!         0.0,
//!         100.0,
//!         Array1::from_shape_fn(60, |i| amplitude * (-0.3 * i as f64 * 0.1).exp()),
//!         Some(Array1::from_elem(60, 0.01)),
//!     )
//!     .unwrap()
//! };
//!
//! let spec = FitSpecification::new("A*exp(-l*t)")
//!     .unwrap()
//!     .with_variable(FitVariable::with_bounds("A", 0.1, 0.0, 1.0))
//!     .with_variable(FitVariable::with_bounds("l", 1.0, 0.0, 5.0).global())
//!     .with_dataset("68011-M20", run(0.20))
//!     .with_dataset("68012-M20", run(0.25))
//!     .with_options(FitOptions { global: true, alpha_correction: false });
//!
//! let result = FitEngine::new().fit(&spec).unwrap();
//! let labels = result.global_solution().unwrap().layout.labels();
//! assert_eq!(labels, vec!["A_68011", "A_68012", "l"]);
//! assert!((result.fit("68012-M20").unwrap().variable("A").unwrap().value() - 0.25).abs() < 1e-4);
//! ```

mod engine;
mod layout;
mod library;
mod residual;
mod result;
mod spec;

pub use engine::{alpha_correction, FitEngine, ALPHA_SYMBOL};
pub use layout::{short_run_id, UnknownLayout, UnknownSlot};
pub use library::{builtin_function, FunctionRegistry, BUILTIN_FUNCTIONS};
pub use residual::{weighted_residual, GlobalProblem, SegmentTable, SingleRunProblem};
pub use result::{Fit, FitDataset, GlobalSolution};
pub use spec::{FitOptions, FitSpecification};
