//! # Error Types
//!
//! Domain-specific error types for pos-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pos-core errors (this file)                                           │
//! │  ├── CoreError        - Business-rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  pos-db errors (separate crate)                                        │
//! │  ├── DbError          - Storage faults                                 │
//! │  └── SaleError        - The three-class taxonomy the HTTP layer sees   │
//! │                                                                         │
//! │  Flow: ValidationError / CoreError / DbError → SaleError → caller      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item name, sale id, amounts)
//! 3. Errors are enum variants, never String
//! 4. Business-rule failures are client-actionable; they are never folded
//!    into storage faults

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business-rule violations.
///
/// These result from valid-but-unsatisfiable requests, are detected inside
/// the transaction, trigger a full rollback, and are reported to the
/// client as actionable errors - never as server faults.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Inventory item does not exist, is inactive, or is soft-deleted.
    #[error("Inventory item {0} not found")]
    ItemNotFound(String),

    /// Stock cannot cover the requested quantity.
    ///
    /// Raised when the conditional atomic decrement refuses the draw,
    /// including the case where a concurrent sale won the last units.
    #[error("Insufficient stock for item {name}. Available: {available}, Requested: {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Sale does not exist (or is soft-deleted).
    #[error("Sale not found")]
    SaleNotFound(String),

    /// Cancellation of a sale that is already cancelled.
    #[error("Sale is already cancelled")]
    AlreadyCancelled(String),

    /// Cancellation of a refunded sale. Refunded is terminal.
    #[error("Cannot cancel a refunded sale")]
    CannotCancelRefunded(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Detected before any transaction opens: no partial state exists when one
/// of these is reported.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            name: "Basmati Rice 5kg".to_string(),
            available: 10,
            requested: 11,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for item Basmati Rice 5kg. Available: 10, Requested: 11"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "store_id".to_string(),
        };
        assert_eq!(err.to_string(), "store_id is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "items".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
