//! Numerical helpers shared by the optimizer and the uncertainty estimator.

#[cfg(feature = "lm")]
pub mod finite_difference;
pub mod matrix_convert;

#[cfg(feature = "lm")]
pub use finite_difference::{jacobian, jacobian_within_bounds};
pub use matrix_convert::{
    nalgebra_to_ndarray, nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra,
};
