//! Box-constrained problems.
//!
//! [`BoundedProblem`] presents a problem with per-parameter bounds to the
//! optimizer as an unconstrained one: the optimizer moves internal
//! coordinates and every evaluation maps them through a [`BoundsTransform`]
//! onto external values inside the bounds.

use ndarray::Array1;

use crate::error::{AsymFitError, Result};
use crate::parameters::{Bounds, BoundsTransform};
use crate::problem::Problem;

/// Wraps a [`Problem`] so that it is evaluated only inside `[lower, upper]`.
pub struct BoundedProblem<'a, P: Problem> {
    inner: &'a P,
    transforms: Vec<BoundsTransform>,
}

impl<'a, P: Problem> BoundedProblem<'a, P> {
    /// Build the wrapper, validating the bounds against the problem size.
    ///
    /// Infinite bounds are allowed; inverted or NaN bounds are rejected.
    pub fn new(inner: &'a P, lower: &Array1<f64>, upper: &Array1<f64>) -> Result<Self> {
        let n = inner.parameter_count();
        if lower.len() != n || upper.len() != n {
            return Err(AsymFitError::Fit(format!(
                "Expected {} bounds, got {} lower and {} upper",
                n,
                lower.len(),
                upper.len()
            )));
        }

        let transforms = lower
            .iter()
            .zip(upper.iter())
            .enumerate()
            .map(|(i, (&min, &max))| {
                Bounds::new(min, max)
                    .map(BoundsTransform::new)
                    .map_err(|e| AsymFitError::Fit(format!("parameter {}: {}", i, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { inner, transforms })
    }

    /// The wrapped problem.
    pub fn inner(&self) -> &P {
        self.inner
    }

    /// Map internal coordinates onto external parameter values.
    pub fn to_external(&self, internal: &Array1<f64>) -> Array1<f64> {
        Array1::from_iter(
            self.transforms
                .iter()
                .zip(internal.iter())
                .map(|(transform, &value)| transform.to_external(value)),
        )
    }

    /// Map external starting values onto internal coordinates.
    ///
    /// A value exactly on a finite bound is first moved strictly inside it
    /// ([`Bounds::strictly_inside`]), since the transform has zero slope at
    /// the bounds. Fails when a value is non-finite or lies outside its
    /// bounds.
    pub fn to_internal(&self, external: &Array1<f64>) -> Result<Array1<f64>> {
        if external.len() != self.transforms.len() {
            return Err(AsymFitError::Fit(format!(
                "Expected {} initial values, got {}",
                self.transforms.len(),
                external.len()
            )));
        }

        let values = self
            .transforms
            .iter()
            .zip(external.iter())
            .enumerate()
            .map(|(i, (transform, &value))| {
                transform
                    .to_internal(transform.bounds().strictly_inside(value))
                    .map_err(|e| AsymFitError::Fit(format!("initial value of parameter {}: {}", i, e)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Array1::from_vec(values))
    }

    /// Lower bounds of the external parameters.
    pub fn lower(&self) -> Array1<f64> {
        self.transforms.iter().map(|t| t.bounds().min).collect()
    }

    /// Upper bounds of the external parameters.
    pub fn upper(&self) -> Array1<f64> {
        self.transforms.iter().map(|t| t.bounds().max).collect()
    }
}

impl<P: Problem> Problem for BoundedProblem<'_, P> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        self.inner.eval(&self.to_external(params))
    }

    fn parameter_count(&self) -> usize {
        self.transforms.len()
    }

    fn residual_count(&self) -> usize {
        self.inner.residual_count()
    }
}
