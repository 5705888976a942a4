//! # Fit Variables
//!
//! Named model parameters and the bounds machinery the optimizer uses to keep
//! them inside their intervals.
//!
//! - [`FitVariable`]: a named parameter with a value, fixed/global flags and
//!   inclusive bounds
//! - [`Bounds`] and [`BoundsTransform`]: validated intervals and the
//!   Minuit-style mapping between bounded and unbounded coordinates
//!
//! ## Example Usage
//!
//! ```rust
//! use asymfit_rs::parameters::FitVariable;
//!
//! let mut lambda = FitVariable::with_bounds("lambda", 0.5, 0.0, 10.0);
//! let alpha = FitVariable::new("α", 1.0).fixed();
//!
//! // Assignment never clamps; bounds are enforced by the optimizer.
//! lambda.set_value(12.0);
//! assert!(!lambda.is_within_bounds());
//! assert!(alpha.fixed);
//! ```

pub mod bounds;
pub mod variable;

pub use bounds::{Bounds, BoundsError, BoundsTransform};
pub use variable::FitVariable;
