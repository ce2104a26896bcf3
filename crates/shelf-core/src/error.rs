//! # Error Types
//!
//! Domain-specific error types for shelf-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shelf-core errors (this file)                                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  shelf-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                        (NotFound lives here, next to the queries)      │
//! │                                                                         │
//! │  Flow: ValidationError → DbError::Validation → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Barcode allocation has no error type: the allocator always
//! produces a code (see `shelf_db::barcode`).

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., non-digit barcode).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., the same category listed twice on an item).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "display_name".to_string(),
        };
        assert_eq!(err.to_string(), "display_name is required");

        let err = ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only digits".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "barcode has invalid format: must contain only digits"
        );
    }
}
