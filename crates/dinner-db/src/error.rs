//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  PostgreSQL error (sqlx::Error)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError::from ← classified by SQLSTATE / driver variant               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  prepare_error(err, "fetching meal") ← wrapped in Context + logged     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  caller inspects err.kind() → HTTP status                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Kind → Caller Mapping
//! ```text
//! InvalidId / NilInput / Validation   → 400
//! NotFound                            → 404
//! UniqueViolation                     → 409
//! Cancelled                           → 499 / 504
//! Transient / Integrity / Internal    → 500
//! ```

use dinner_core::ValidationError;
use thiserror::Error;

/// SQLSTATE for `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE for `query_canceled` (statement timeout or cancel request).
pub const QUERY_CANCELED: &str = "57014";

/// Stable classification of a [`DbError`], independent of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidId,
    NilInput,
    Validation,
    NotFound,
    UniqueViolation,
    Cancelled,
    Transient,
    Integrity,
    Internal,
}

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// An ID argument was empty.
    ///
    /// ## When This Occurs
    /// - `get_meal("")`
    /// - Any owner ID passed as an empty string
    #[error("invalid ID provided")]
    InvalidId,

    /// A required input was absent.
    ///
    /// ## When This Occurs
    /// - An empty batch passed where at least one element is required
    #[error("required input was not provided")]
    NilInput,

    /// Input failed a domain rule before reaching SQL.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The row does not exist, is archived, or belongs to another owner.
    #[error("record not found")]
    NotFound,

    /// Unique constraint violation (SQLSTATE 23505).
    ///
    /// ## When This Occurs
    /// - Registering a taken username
    /// - A second active preference for the same ingredient
    #[error("duplicate value violates {constraint}")]
    UniqueViolation { constraint: String },

    /// The caller gave up: deadline exceeded, future dropped, or the server
    /// cancelled the statement.
    #[error("operation cancelled: {reason}")]
    Cancelled { reason: String },

    /// Connection refused, reset, pool exhausted, serialization failure.
    /// Retrying may succeed.
    #[error("transient database failure: {0}")]
    Transient(String),

    /// A stored value could not be decoded into its domain type.
    #[error("corrupted {column} value {value:?}: {reason}")]
    Integrity {
        column: String,
        value: String,
        reason: String,
    },

    /// The connection block failed validation.
    #[error("invalid database configuration: {0}")]
    Config(String),

    /// Connection could not be established.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Another error, annotated with the operation that produced it.
    #[error("{operation}: {source}")]
    Context {
        operation: String,
        source: Box<DbError>,
    },

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Wraps this error with a description of the failing operation.
    pub fn context(self, operation: impl Into<String>) -> Self {
        DbError::Context {
            operation: operation.into(),
            source: Box::new(self),
        }
    }

    /// Creates an Integrity error for an undecodable stored value.
    pub fn integrity(
        column: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        DbError::Integrity {
            column: column.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// The classification of the innermost error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::InvalidId => ErrorKind::InvalidId,
            DbError::NilInput => ErrorKind::NilInput,
            DbError::Validation(_) => ErrorKind::Validation,
            DbError::NotFound => ErrorKind::NotFound,
            DbError::UniqueViolation { .. } => ErrorKind::UniqueViolation,
            DbError::Cancelled { .. } => ErrorKind::Cancelled,
            DbError::Transient(_) | DbError::ConnectionFailed(_) => ErrorKind::Transient,
            DbError::Integrity { .. } => ErrorKind::Integrity,
            DbError::Config(_) | DbError::MigrationFailed(_) | DbError::Internal(_) => {
                ErrorKind::Internal
            }
            DbError::Context { source, .. } => source.kind(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Whether this error is the caller's fault and should not be logged.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidId | ErrorKind::NilInput | ErrorKind::Validation
        )
    }
}

/// Rejects empty IDs before any SQL runs.
pub fn require_id(id: &str) -> DbResult<()> {
    if id.trim().is_empty() {
        return Err(DbError::InvalidId);
    }
    Ok(())
}

/// Rejects any empty ID in a list of owner/entity IDs.
pub fn require_ids(ids: &[&str]) -> DbResult<()> {
    ids.iter().try_for_each(|id| require_id(id))
}

fn is_transient_sqlstate(code: &str) -> bool {
    code.starts_with("08")
        || code.starts_with("53")
        || matches!(code, "40001" | "40P01" | "57P01" | "57P02" | "57P03")
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound            → DbError::NotFound
/// Database, SQLSTATE 23505            → DbError::UniqueViolation
/// Database, SQLSTATE 57014            → DbError::Cancelled
/// Database, 08xxx/53xxx/40001/40P01   → DbError::Transient
/// Io / Tls / PoolTimedOut             → DbError::Transient
/// ColumnDecode                        → DbError::Integrity
/// Other                               → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound,

            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string()).unwrap_or_default();

                if code == UNIQUE_VIOLATION {
                    DbError::UniqueViolation {
                        constraint: db_err.constraint().unwrap_or("unknown").to_string(),
                    }
                } else if code == QUERY_CANCELED {
                    DbError::Cancelled {
                        reason: db_err.message().to_string(),
                    }
                } else if is_transient_sqlstate(&code) {
                    DbError::Transient(db_err.message().to_string())
                } else {
                    DbError::Internal(format!("{} (SQLSTATE {})", db_err.message(), code))
                }
            }

            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut => {
                DbError::Transient(err.to_string())
            }

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::ColumnDecode { index, source } => DbError::Integrity {
                column: index,
                value: String::new(),
                reason: source.to_string(),
            },

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for DbError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        DbError::Cancelled {
            reason: "deadline exceeded".to_string(),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = DbError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_pool_timeout_is_transient() {
        let err = DbError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(err.kind(), ErrorKind::Transient);
    }

    #[test]
    fn test_context_preserves_kind_and_message() {
        let err = DbError::NotFound
            .context("fetching recipe step")
            .context("creating recipe step ingredient #2");

        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "creating recipe step ingredient #2: fetching recipe step: record not found"
        );
    }

    #[test]
    fn test_input_errors() {
        assert!(DbError::InvalidId.is_input_error());
        assert!(DbError::NilInput.context("creating votes").is_input_error());
        assert!(!DbError::NotFound.is_input_error());
    }

    #[test]
    fn test_require_ids() {
        assert!(require_ids(&["a", "b"]).is_ok());
        assert!(matches!(require_ids(&["a", " "]), Err(DbError::InvalidId)));
    }

    #[test]
    fn test_transient_sqlstates() {
        assert!(is_transient_sqlstate("08006"));
        assert!(is_transient_sqlstate("40001"));
        assert!(is_transient_sqlstate("53300"));
        assert!(!is_transient_sqlstate("23503"));
    }
}
