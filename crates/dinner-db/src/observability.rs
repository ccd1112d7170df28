//! # Error Reporting
//!
//! Every error leaving a repository method passes through
//! [`prepare_error`] exactly once.
//!
//! ```text
//! query fails ──► DbError ──► prepare_error(err, "fetching meal")
//!                                  │
//!                                  ├── input error? return as-is, no log
//!                                  │
//!                                  └── error!(error = %err, "fetching meal")
//!                                      inside the method's span, then wrap
//!                                      in DbError::Context
//! ```
//!
//! Callers never need to log these errors again.

use tracing::error;

use crate::error::DbError;

/// Annotates a database-origin error with the failing operation and logs it
/// in the current span.
///
/// Caller errors (`InvalidId`, `NilInput`, `Validation`) are returned
/// untouched.
pub fn prepare_error(err: impl Into<DbError>, description: &str) -> DbError {
    let err = err.into();
    if err.is_input_error() {
        return err;
    }

    error!(error = %err, kind = ?err.kind(), "{description}");
    err.context(description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_database_errors_get_context() {
        let err = prepare_error(sqlx::Error::RowNotFound, "fetching valid vessel");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "fetching valid vessel: record not found");
    }

    #[test]
    fn test_input_errors_pass_through() {
        let err = prepare_error(DbError::InvalidId, "fetching valid vessel");
        assert!(matches!(err, DbError::InvalidId));
    }
}
