//! # Database Error Types
//!
//! Error types for database operations, plus the three-class error
//! taxonomy the sale workflows expose to their caller.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (storage fault) ──────────────┐                               │
//! │                                        │                               │
//! │  ValidationError (before any tx) ──────┤──► SaleError ──► HTTP layer   │
//! │                                        │                               │
//! │  CoreError (business rule, rolled ─────┘                               │
//! │  back inside the tx)                                                   │
//! │                                                                         │
//! │  The three classes stay distinct variants so the caller can map them   │
//! │  to 400 / 422 / 500 without string matching, and retry policy can be   │
//! │  "storage faults only".                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use pos_core::{CoreError, ValidationError};

// =============================================================================
// DbError: storage faults
// =============================================================================

/// Database operation errors.
///
/// These wrap sqlx errors and provide categorization. They represent
/// unexpected storage failures: the caller reports them opaquely and may
/// retry idempotently; they are never business-rule outcomes.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found where one was required by storage plumbing
    /// (distinct from the business-rule "item/sale not found" which is a
    /// [`CoreError`]).
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (duplicate item code, sale number).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite error messages for constraints:
                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // FK constraint: "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// SaleError: the caller-facing taxonomy
// =============================================================================

/// What the sale workflows return: exactly one of the three error classes.
///
/// - `Validation`: rejected before any transaction opened; no partial state
/// - `Rule`: valid-but-unsatisfiable request; the transaction was rolled
///   back in full; client-actionable, never retried as-is
/// - `Storage`: unexpected fault; rolled back; opaque to the client and
///   the only class the caller may retry
///
/// Nested errors are propagated verbatim, never wrapped in extra context.
#[derive(Debug, Error)]
pub enum SaleError {
    #[error(transparent)]
    Validation(ValidationError),

    #[error(transparent)]
    Rule(CoreError),

    #[error(transparent)]
    Storage(#[from] DbError),
}

impl From<CoreError> for SaleError {
    fn from(err: CoreError) -> Self {
        // A CoreError that wraps a validation failure still belongs to the
        // validation class.
        match err {
            CoreError::Validation(v) => SaleError::Validation(v),
            other => SaleError::Rule(other),
        }
    }
}

impl From<ValidationError> for SaleError {
    fn from(err: ValidationError) -> Self {
        SaleError::Validation(err)
    }
}

impl SaleError {
    /// True when retrying the identical request could succeed (storage
    /// faults only; retrying "insufficient stock" is meaningless).
    pub fn is_retryable(&self) -> bool {
        matches!(self, SaleError::Storage(_))
    }
}

/// Result type for the sale workflows.
pub type SaleResult<T> = Result<T, SaleError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_validation_maps_to_validation_class() {
        let core = CoreError::Validation(ValidationError::Required {
            field: "items".to_string(),
        });
        assert!(matches!(SaleError::from(core), SaleError::Validation(_)));
    }

    #[test]
    fn test_rule_errors_keep_their_class() {
        let core = CoreError::InsufficientStock {
            name: "Sugar 1kg".to_string(),
            available: 2,
            requested: 5,
        };
        let err = SaleError::from(core);
        assert!(matches!(err, SaleError::Rule(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_only_storage_is_retryable() {
        let err = SaleError::from(DbError::PoolExhausted);
        assert!(err.is_retryable());
    }
}
