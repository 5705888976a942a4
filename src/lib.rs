//! # asymfit-rs
//!
//! `asymfit-rs` reduces muon-spin rotation/relaxation (μSR) histograms to
//! asymmetry signals and fits user-defined models to them by bounded
//! nonlinear least squares.
//!
//! The library provides:
//! - An asymmetry pipeline: background correction, counting uncertainties,
//!   rebinning, spline smoothing and a spectral transform
//! - Run-time model expressions such as `A(t) = A0*exp(-λ*t)`, with free
//!   parameter detection and compilation to a fast evaluator
//! - A Levenberg-Marquardt optimizer with box constraints
//! - Per-run and global (multi-run, shared-parameter) fitting with optional
//!   alpha correction
//! - Parameter uncertainties from the Jacobian at the solution
//!
//! ## Basic Usage
//!
//! ```
//! use asymfit_rs::asymmetry::AsymmetrySeries;
//! use asymfit_rs::parameters::FitVariable;
//! use asymfit_rs::{FitEngine, FitSpecification};
//! use ndarray::Array1;
//!
//! let series = AsymmetrySeries::from_values(
//!     0.0,
//!     50.0,
//!     Array1::from_shape_fn(200, |i| 0.2 * (-0.1 * i as f64 * 0.05).exp()),
//!     Some(Array1::from_elem(200, 0.005)),
//! )
//! .unwrap();
//!
//! let spec = FitSpecification::new("A(t) = A0*exp(-λ*t)")
//!     .unwrap()
//!     .with_variable(FitVariable::with_bounds("A0", 0.3, 0.0, 1.0))
//!     .with_variable(FitVariable::with_bounds("λ", 1.0, 0.0, 10.0))
//!     .with_dataset("68011-M20", series);
//!
//! let result = FitEngine::new().fit(&spec).unwrap();
//! let fit = result.fit("68011-M20").unwrap();
//! assert!((fit.variable("λ").unwrap().value() - 0.1).abs() < 1e-3);
//! assert!((fit.evaluate_at(0.0) - 0.2).abs() < 1e-3);
//! ```

pub mod asymmetry;
pub mod error;
pub mod expression;
pub mod parameters;

#[cfg(feature = "matrix")]
pub mod utils;

#[cfg(feature = "lm")]
pub mod problem;

#[cfg(feature = "lm")]
pub mod lm;

#[cfg(feature = "lm")]
pub mod uncertainty;

#[cfg(feature = "lm")]
pub mod fit;

// Re-exports for convenience
pub use error::{AsymFitError, Result};

#[cfg(feature = "lm")]
pub use fit::{FitEngine, FitSpecification};

#[cfg(feature = "lm")]
pub use lm::LevenbergMarquardt;

#[cfg(feature = "lm")]
pub use problem::Problem;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
