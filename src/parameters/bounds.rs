//! Parameter bounds implementation
//!
//! This module provides the box constraints used by the bounded fits. It
//! implements the Minuit-style parameter transformation so the optimizer can
//! work with unbounded internal values while the model only ever sees values
//! inside the bounds.

use std::f64::{INFINITY, NEG_INFINITY};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when working with parameter bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must be less than max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Parameter value {value} is outside bounds: [{min}, {max}]")]
    ValueOutsideBounds { value: f64, min: f64, max: f64 },

    #[error("Infinite parameter value is not allowed")]
    InfiniteValue,
}

/// Represents the bounds constraints on a parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
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
    /// Create a new bounds constraint with min and max values
    ///
    /// # Examples
    ///
    /// ```
    /// use dcm_fit::parameters::Bounds;
    ///
    /// let bounds = Bounds::new(0.0, 10.0).unwrap();
    /// assert_eq!(bounds.min, 0.0);
    /// assert_eq!(bounds.max, 10.0);
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        if min.is_nan() || max.is_nan() || min >= max {
            return Err(BoundsError::InvalidBounds { min, max });
        }

        Ok(Self { min, max })
    }

    /// Create an unbounded constraint (negative infinity to positive infinity)
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Create a bounds constraint with only a minimum value
    pub fn min_only(min: f64) -> Self {
        Self { min, max: INFINITY }
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
}

/// Implements the Minuit-style parameter transformations for handling bounds constraints
///
/// This allows the optimizer to work with unbounded parameters internally, while the
/// external values are constrained to be within the specified bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsTransform {
    bounds: Bounds,
}

impl BoundsTransform {
    /// Create a new bounds transform
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    /// The bounds this transform maps into.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Transform an internal parameter value to an external value
    ///
    /// The result always lies within the bounds.
    pub fn to_external(&self, internal_value: f64) -> f64 {
        match (self.bounds.has_lower_bound(), self.bounds.has_upper_bound()) {
            (false, false) => internal_value,
            (true, false) => self.bounds.min - 1.0 + (internal_value * internal_value + 1.0).sqrt(),
            (false, true) => self.bounds.max + 1.0 - (internal_value * internal_value + 1.0).sqrt(),
            (true, true) => {
                let bound_range = self.bounds.max - self.bounds.min;
                self.bounds.min + (internal_value.sin() + 1.0) * bound_range / 2.0
            }
        }
    }

    /// Transform an external parameter value to an internal value
    ///
    /// Fails if the external value is not finite or lies outside the bounds.
    pub fn to_internal(&self, external_value: f64) -> Result<f64, BoundsError> {
        if !external_value.is_finite() {
            return Err(BoundsError::InfiniteValue);
        }

        if !self.bounds.is_within_bounds(external_value) {
            return Err(BoundsError::ValueOutsideBounds {
                value: external_value,
                min: self.bounds.min,
                max: self.bounds.max,
            });
        }

        let internal = match (self.bounds.has_lower_bound(), self.bounds.has_upper_bound()) {
            (false, false) => external_value,
            (true, false) => ((external_value - self.bounds.min + 1.0).powi(2) - 1.0).sqrt(),
            (false, true) => ((self.bounds.max - external_value + 1.0).powi(2) - 1.0).sqrt(),
            (true, true) => {
                let bound_range = self.bounds.max - self.bounds.min;
                let scaled = 2.0 * (external_value - self.bounds.min) / bound_range - 1.0;

                // Ensure scaled is in [-1, 1] for asin
                scaled.clamp(-1.0, 1.0).asin()
            }
        };

        Ok(internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_creation() {
        let bounds = Bounds::new(0.0, 10.0).unwrap();
        assert_eq!(bounds.min, 0.0);
        assert_eq!(bounds.max, 10.0);

        // Invalid bounds (min > max)
        assert!(Bounds::new(10.0, 0.0).is_err());
        // Empty interval
        assert_eq!(
            Bounds::new(2.0, 2.0),
            Err(BoundsError::InvalidBounds { min: 2.0, max: 2.0 })
        );
        assert!(Bounds::new(f64::NAN, 0.0).is_err());

        let bounds = Bounds::unbounded();
        assert_eq!(bounds.min, NEG_INFINITY);
        assert_eq!(bounds.max, INFINITY);

        let bounds = Bounds::min_only(5.0);
        assert_eq!(bounds.min, 5.0);
        assert_eq!(bounds.max, INFINITY);
    }

    #[test]
    fn test_is_within_bounds() {
        let bounds = Bounds::new(0.0, 10.0).unwrap();

        assert!(bounds.is_within_bounds(0.0));
        assert!(bounds.is_within_bounds(5.0));
        assert!(bounds.is_within_bounds(10.0));

        assert!(!bounds.is_within_bounds(-1.0));
        assert!(!bounds.is_within_bounds(11.0));
    }

    #[test]
    fn test_clamp() {
        let bounds = Bounds::new(0.0, 10.0).unwrap();

        assert_eq!(bounds.clamp(-5.0), 0.0);
        assert_eq!(bounds.clamp(5.0), 5.0);
        assert_eq!(bounds.clamp(15.0), 10.0);
    }

    #[test]
    fn test_bounds_transform_unbounded() {
        let transform = BoundsTransform::new(Bounds::unbounded());

        for &value in &[-10.0, -1.0, 0.0, 1.0, 10.0] {
            assert_eq!(transform.to_external(value), value);
            assert_eq!(transform.to_internal(value).unwrap(), value);
        }
    }

    #[test]
    fn test_bounds_transform_lower_bound() {
        let bounds = Bounds::min_only(1e-6);
        let transform = BoundsTransform::new(bounds);

        for &internal in &[1.0, 5.0, 10.0] {
            let external = transform.to_external(internal);
            assert!(external >= bounds.min);

            let round_trip = transform.to_internal(external).unwrap();
            assert!(
                (internal - round_trip).abs() < 1e-8,
                "Round-trip difference: {}",
                (internal - round_trip).abs()
            );
        }

        // Any internal value maps inside the bounds, including negative ones
        assert!(transform.to_external(-3.0) >= bounds.min);
    }

    #[test]
    fn test_bounds_transform_upper_bound() {
        let bounds = Bounds::new(NEG_INFINITY, 5.0).unwrap();
        let transform = BoundsTransform::new(bounds);

        for &internal in &[1.0, 5.0, 10.0] {
            let external = transform.to_external(internal);
            assert!(external <= bounds.max);

            let round_trip = transform.to_internal(external).unwrap();
            assert!((internal - round_trip).abs() < 1e-8);
        }
    }

    #[test]
    fn test_bounds_transform_both_bounds() {
        let bounds = Bounds::new(-15.0, 20.0).unwrap();
        let transform = BoundsTransform::new(bounds);

        for &internal in &[0.0, 0.5, 1.0, -1.2] {
            let external = transform.to_external(internal);
            assert!(external >= bounds.min);
            assert!(external <= bounds.max);

            let round_trip = transform.to_internal(external).unwrap();
            assert!((internal - round_trip).abs() < 1e-8);
        }
    }

    #[test]
    fn test_bounds_transform_errors() {
        let transform = BoundsTransform::new(Bounds::new(0.0, 10.0).unwrap());

        assert!(transform.to_internal(-1.0).is_err());
        assert!(transform.to_internal(11.0).is_err());
        assert_eq!(transform.to_internal(INFINITY), Err(BoundsError::InfiniteValue));
        assert_eq!(transform.to_internal(NEG_INFINITY), Err(BoundsError::InfiniteValue));
    }
}
