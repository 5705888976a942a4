//! Parameter bounds implementation
//!
//! Bounds on fit variables are advisory: assigning a value never clamps it.
//! They are enforced by the optimizer through the Minuit-style transform in
//! [`BoundsTransform`], which maps an unbounded internal coordinate onto the
//! closed interval `[min, max]`.

use serde::{Deserialize, Deserializer, Serializer};
use std::f64::{INFINITY, NEG_INFINITY};
use thiserror::Error;

/// Errors that can occur when working with parameter bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must not exceed max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Parameter value {value} is outside bounds: [{min}, {max}]")]
    ValueOutsideBounds { value: f64, min: f64, max: f64 },

    #[error("Non-finite parameter value is not allowed")]
    NonFiniteValue,
}

/// Represents the bounds constraints on a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum allowed value for the parameter
    pub min: f64,

    /// Maximum allowed value for the parameter
    pub max: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: NEG_INFINITY,
            max: INFINITY,
        }
    }
}

impl Bounds {
    /// Create bounds from min and max values.
    ///
    /// # Examples
    ///
    /// ```
    /// use asymfit_rs::parameters::Bounds;
    ///
    /// let bounds = Bounds::new(0.0, 10.0).unwrap();
    /// assert_eq!(bounds.min, 0.0);
    /// assert_eq!(bounds.max, 10.0);
    /// assert!(Bounds::new(1.0, 0.0).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(BoundsError::InvalidBounds { min, max });
        }

        Ok(Self { min, max })
    }

    /// Create an unbounded constraint (negative infinity to positive infinity)
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Check if a value is within the bounds
    pub fn is_within_bounds(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Check if the parameter is bounded from below
    pub fn has_lower_bound(&self) -> bool {
        self.min.is_finite()
    }

    /// Check if the parameter is bounded from above
    pub fn has_upper_bound(&self) -> bool {
        self.max.is_finite()
    }

    /// Clamp a value to be within the bounds
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Move a value lying exactly on a finite bound slightly inside the
    /// interval.
    ///
    /// The offset is `1e-10 * max(1, |bound|)`, or half the width for
    /// intervals narrower than that. Every other value, zero-width intervals
    /// included, is returned unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use asymfit_rs::parameters::Bounds;
    ///
    /// let bounds = Bounds::new(0.0, 1.0).unwrap();
    /// assert_eq!(bounds.strictly_inside(0.0), 1e-10);
    /// assert_eq!(bounds.strictly_inside(0.5), 0.5);
    /// ```
    pub fn strictly_inside(&self, value: f64) -> f64 {
        let width = self.max - self.min;
        if width <= 0.0 {
            return value;
        }

        let offset = |bound: f64| INTERIOR_OFFSET * bound.abs().max(1.0);
        let nudged = if self.has_lower_bound() && value == self.min {
            self.min + offset(self.min)
        } else if self.has_upper_bound() && value == self.max {
            self.max - offset(self.max)
        } else {
            return value;
        };

        if nudged > self.min && nudged < self.max {
            nudged
        } else {
            self.min + width / 2.0
        }
    }
}

/// Relative distance from a bound at which a starting value is placed.
const INTERIOR_OFFSET: f64 = 1e-10;

/// Implements the Minuit-style parameter transformations for handling bounds constraints
///
/// The optimizer works on unbounded internal values while the external values
/// handed to the model always stay inside the bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsTransform {
    bounds: Bounds,
}

impl BoundsTransform {
    /// Create a new bounds transform
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    /// The bounds this transform maps onto.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Transform an internal parameter value to an external value
    ///
    /// The result is clamped so that rounding can never push it past a bound.
    pub fn to_external(&self, internal_value: f64) -> f64 {
        let bounds = &self.bounds;
        let external = match (bounds.has_lower_bound(), bounds.has_upper_bound()) {
            (false, false) => return internal_value,
            (true, false) => bounds.min - 1.0 + (internal_value * internal_value + 1.0).sqrt(),
            (false, true) => bounds.max + 1.0 - (internal_value * internal_value + 1.0).sqrt(),
            (true, true) => {
                let bound_range = bounds.max - bounds.min;
                bounds.min + (internal_value.sin() + 1.0) * bound_range / 2.0
            }
        };
        bounds.clamp(external)
    }

    /// Transform an external parameter value to an internal value
    pub fn to_internal(&self, external_value: f64) -> Result<f64, BoundsError> {
        if !external_value.is_finite() {
            return Err(BoundsError::NonFiniteValue);
        }

        let bounds = &self.bounds;
        if !bounds.is_within_bounds(external_value) {
            return Err(BoundsError::ValueOutsideBounds {
                value: external_value,
                min: bounds.min,
                max: bounds.max,
            });
        }

        let internal = match (bounds.has_lower_bound(), bounds.has_upper_bound()) {
            (false, false) => external_value,
            (true, false) => ((external_value - bounds.min + 1.0).powi(2) - 1.0).sqrt(),
            (false, true) => ((bounds.max - external_value + 1.0).powi(2) - 1.0).sqrt(),
            (true, true) => {
                let bound_range = bounds.max - bounds.min;
                if bound_range == 0.0 {
                    // Degenerate interval: every internal value maps to min.
                    0.0
                } else {
                    let scaled = 2.0 * (external_value - bounds.min) / bound_range - 1.0;
                    scaled.clamp(-1.0, 1.0).asin()
                }
            }
        };

        Ok(internal)
    }
}

/// Serialize a bound, writing infinities as `null` so they survive JSON.
pub(crate) fn serialize_bound<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_infinite() {
        serializer.serialize_none()
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Deserialize a lower bound, reading `null` as negative infinity.
pub(crate) fn deserialize_lower<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(NEG_INFINITY))
}

/// Deserialize an upper bound, reading `null` as positive infinity.
pub(crate) fn deserialize_upper<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(INFINITY))
}
