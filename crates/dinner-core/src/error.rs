//! # Error Types
//!
//! Domain-specific error types for dinner-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  dinner-core errors (this file)                                        │
//! │  └── ValidationError  - Input rule violations                          │
//! │                                                                         │
//! │  dinner-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → DbError::Validation → HTTP 400                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any SQL runs. The repository never logs these; they
/// describe the caller's mistake, not a failure of the store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// String exceeds maximum length.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value outside allowed range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// A range value object whose upper bound is below its lower bound.
    ///
    /// ## When This Occurs
    /// - `Float32RangeWithOptionalMax { min: 4.0, max: Some(2.0) }`
    /// - Estimated portions, allowable quantities, temperature windows
    #[error("{field} has a maximum ({max}) lower than its minimum ({min})")]
    InvertedRange { field: String, min: f64, max: f64 },

    /// A string that should name a known enumerated value does not.
    #[error("{value:?} is not a valid {field}")]
    UnknownValue { field: String, value: String },

    /// A collection that must contain at least one element is empty.
    #[error("{field} must not be empty")]
    Empty { field: String },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::UnknownValue`].
    pub fn unknown_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        ValidationError::UnknownValue {
            field: field.into(),
            value: value.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ValidationError::required("name");
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::InvertedRange {
            field: "estimated_portions".to_string(),
            min: 4.0,
            max: 2.0,
        };
        assert_eq!(
            err.to_string(),
            "estimated_portions has a maximum (2) lower than its minimum (4)"
        );

        let err = ValidationError::unknown_value("meal plan status", "voting");
        assert_eq!(err.to_string(), "\"voting\" is not a valid meal plan status");
    }
}
