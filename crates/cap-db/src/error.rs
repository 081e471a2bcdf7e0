//! Database error types for cap-db.

use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned a row that could not be decoded.
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Trail file I/O and other unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    /// Whether the error is a `UNIQUE` constraint violation.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::LibSql(e) => crate::retry::is_unique_violation(e),
            _ => false,
        }
    }

    /// Whether the error is transient lock contention worth retrying.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        match self {
            Self::LibSql(e) => crate::retry::is_busy_error(e),
            _ => false,
        }
    }
}
