//! Fit variable definition
//!
//! A [`FitVariable`] is one named parameter of a user model: its current (or
//! best-fit) value, whether it is held fixed, whether it is shared across runs
//! in a global fit, and its advisory bounds.

use crate::parameters::bounds::{
    deserialize_lower, deserialize_upper, serialize_bound, Bounds, BoundsError,
};
use serde::{Deserialize, Serialize};
use std::f64::{INFINITY, NEG_INFINITY};

/// A named model parameter.
///
/// Bounds are advisory: [`FitVariable::set_value`] never clamps or rejects a
/// value. The optimizer enforces `lower <= value <= upper` for unfixed
/// variables and reports a fit error when a guess violates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitVariable {
    /// Symbol of the parameter as it appears in the model expression
    pub name: String,

    /// Current value (the guess before a fit, the best-fit value after)
    value: f64,

    /// Whether the variable is held constant during optimization
    #[serde(default)]
    pub fixed: bool,

    /// Whether the variable is shared across all runs of a global fit
    #[serde(default)]
    pub global: bool,

    /// Inclusive lower bound
    #[serde(
        serialize_with = "serialize_bound",
        deserialize_with = "deserialize_lower",
        default = "neg_infinity"
    )]
    lower: f64,

    /// Inclusive upper bound
    #[serde(
        serialize_with = "serialize_bound",
        deserialize_with = "deserialize_upper",
        default = "infinity"
    )]
    upper: f64,
}

fn neg_infinity() -> f64 {
    NEG_INFINITY
}

fn infinity() -> f64 {
    INFINITY
}

impl FitVariable {
    /// Create a free, non-global, unbounded variable.
    ///
    /// # Examples
    ///
    /// ```
    /// use asymfit_rs::parameters::FitVariable;
    ///
    /// let var = FitVariable::new("lambda", 0.5);
    /// assert_eq!(var.name, "lambda");
    /// assert_eq!(var.value(), 0.5);
    /// assert!(!var.fixed);
    /// assert!(!var.global);
    /// ```
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            fixed: false,
            global: false,
            lower: NEG_INFINITY,
            upper: INFINITY,
        }
    }

    /// Create a free, non-global variable with inclusive bounds.
    pub fn with_bounds(name: &str, value: f64, lower: f64, upper: f64) -> Self {
        Self {
            lower,
            upper,
            ..Self::new(name, value)
        }
    }

    /// Mark the variable as fixed (builder style).
    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    /// Mark the variable as shared across runs (builder style).
    pub fn global(mut self) -> Self {
        self.global = true;
        self
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Overwrite the stored value. Bounds are not consulted.
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Replace both bounds. The stored value is left untouched.
    pub fn set_bounds(&mut self, lower: f64, upper: f64) {
        self.lower = lower;
        self.upper = upper;
    }

    /// Validated bounds, or an error if `lower > upper`.
    pub fn bounds(&self) -> Result<Bounds, BoundsError> {
        Bounds::new(self.lower, self.upper)
    }

    /// Whether the stored value respects the bounds.
    pub fn is_within_bounds(&self) -> bool {
        self.value >= self.lower && self.value <= self.upper
    }
}
