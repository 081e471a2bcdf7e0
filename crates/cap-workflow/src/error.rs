//! Workflow error type: a domain rejection or a storage failure.

use cap_core::errors::CoreError;
use cap_db::error::DatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A validation, authorization, lock or state-machine guard refused the operation.
    #[error(transparent)]
    Rejected(#[from] CoreError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl WorkflowError {
    /// The domain error, if this is a rejection.
    #[must_use]
    pub const fn as_core(&self) -> Option<&CoreError> {
        match self {
            Self::Rejected(e) => Some(e),
            Self::Database(_) => None,
        }
    }
}

/// Readable per-item reason for a bulk operation's failure list.
#[must_use]
pub fn skip_reason(err: &WorkflowError) -> String {
    match err {
        WorkflowError::Rejected(core) => match core {
            CoreError::NotFound { .. } => "Entry not found".to_string(),
            CoreError::Forbidden(reason) => reason.as_str().to_string(),
            CoreError::PeriodLocked { period } => format!("Period {period} is locked"),
            CoreError::InvalidTransition { from, .. } => format!("Entry is {from}"),
            CoreError::Validation(message) => message.clone(),
            CoreError::Unauthorized => "Authentication required".to_string(),
        },
        WorkflowError::Database(_) => "Internal error".to_string(),
    }
}
