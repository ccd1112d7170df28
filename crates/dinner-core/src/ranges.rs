//! # Range Value Objects
//!
//! Min/max pairs that appear across the recipe and ingredient model.
//!
//! ## Shapes
//! ```text
//! ┌──────────────────────────────────┬──────────┬──────────┐
//! │ Type                             │ min      │ max      │
//! ├──────────────────────────────────┼──────────┼──────────┤
//! │ Float32RangeWithOptionalMax      │ f32      │ Option   │
//! │ OptionalFloat32Range             │ Option   │ Option   │
//! │ Uint16RangeWithOptionalMax       │ u16      │ Option   │
//! │ Uint32RangeWithOptionalMax       │ u32      │ Option   │
//! │ OptionalUint32Range              │ Option   │ Option   │
//! └──────────────────────────────────┴──────────┴──────────┘
//! ```
//!
//! Every shape persists as two columns (`min_*`, `max_*`). A missing bound
//! is stored as NULL. `max < min` is rejected by [`validate`](Float32RangeWithOptionalMax::validate)
//! before anything reaches the database.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

fn check(field: &str, min: Option<f64>, max: Option<f64>) -> Result<(), ValidationError> {
    match (min, max) {
        (Some(min), Some(max)) if max < min => Err(ValidationError::InvertedRange {
            field: field.to_string(),
            min,
            max,
        }),
        _ => Ok(()),
    }
}

/// A float range with a required lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Float32RangeWithOptionalMax {
    pub min: f32,
    pub max: Option<f32>,
}

impl Float32RangeWithOptionalMax {
    pub fn new(min: f32, max: Option<f32>) -> Self {
        Self { min, max }
    }

    pub fn validate(&self, field: &str) -> Result<(), ValidationError> {
        check(field, Some(self.min as f64), self.max.map(f64::from))
    }
}

/// A float range where either bound may be unknown.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OptionalFloat32Range {
    pub min: Option<f32>,
    pub max: Option<f32>,
}

impl OptionalFloat32Range {
    pub fn new(min: Option<f32>, max: Option<f32>) -> Self {
        Self { min, max }
    }

    pub fn validate(&self, field: &str) -> Result<(), ValidationError> {
        check(field, self.min.map(f64::from), self.max.map(f64::from))
    }
}

/// A small unsigned range (vessel quantities, ingredient counts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Uint16RangeWithOptionalMax {
    pub min: u16,
    pub max: Option<u16>,
}

impl Uint16RangeWithOptionalMax {
    pub fn new(min: u16, max: Option<u16>) -> Self {
        Self { min, max }
    }

    pub fn validate(&self, field: &str) -> Result<(), ValidationError> {
        check(field, Some(self.min as f64), self.max.map(f64::from))
    }
}

/// An unsigned range with a required lower bound (instrument quantities).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Uint32RangeWithOptionalMax {
    pub min: u32,
    pub max: Option<u32>,
}

impl Uint32RangeWithOptionalMax {
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    pub fn validate(&self, field: &str) -> Result<(), ValidationError> {
        check(field, Some(self.min as f64), self.max.map(f64::from))
    }
}

/// An unsigned range where either bound may be unknown (durations in seconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OptionalUint32Range {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

impl OptionalUint32Range {
    pub fn new(min: Option<u32>, max: Option<u32>) -> Self {
        Self { min, max }
    }

    pub fn validate(&self, field: &str) -> Result<(), ValidationError> {
        check(field, self.min.map(f64::from), self.max.map(f64::from))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_ranges_rejected() {
        assert!(Float32RangeWithOptionalMax::new(4.0, Some(2.0))
            .validate("portions")
            .is_err());
        assert!(OptionalUint32Range::new(Some(600), Some(60))
            .validate("time")
            .is_err());
        assert!(Uint16RangeWithOptionalMax::new(3, Some(1))
            .validate("quantity")
            .is_err());
    }

    #[test]
    fn test_open_and_equal_ranges_accepted() {
        assert!(Float32RangeWithOptionalMax::new(1.0, None)
            .validate("portions")
            .is_ok());
        assert!(Float32RangeWithOptionalMax::new(2.0, Some(2.0))
            .validate("portions")
            .is_ok());
        assert!(OptionalFloat32Range::new(None, Some(-4.0))
            .validate("temperature")
            .is_ok());
        assert!(Uint32RangeWithOptionalMax::new(1, Some(3))
            .validate("quantity")
            .is_ok());
    }
}
