//! Domain error taxonomy for captrack.
//!
//! Every guard in the workflow engine fails with one of these variants.
//! Storage errors are defined in `cap-db`; the engine and the HTTP layer
//! combine both.

use thiserror::Error;

use crate::period::Period;

/// Why an authenticated actor was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenReason {
    /// The entry belongs to another developer and the actor is not a manager or admin.
    NotOwner,
    /// The operation requires a manager or admin role.
    InsufficientRole,
    /// Segregation of duties: reviewers may not approve or reject their own entries.
    SelfApproval,
}

impl ForbiddenReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotOwner => "Not your entry",
            Self::InsufficientRole => "Insufficient role for this operation",
            Self::SelfApproval => "Approving or rejecting your own entry is forbidden",
        }
    }

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotOwner => "NOT_OWNER",
            Self::InsufficientRole => "INSUFFICIENT_ROLE",
            Self::SelfApproval => "SELF_APPROVAL",
        }
    }
}

/// Errors raised by entry lifecycle guards.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed or out-of-range input. Raised before any guard or write.
    #[error("Validation error: {0}")]
    Validation(String),

    /// No actor identity accompanied the request.
    #[error("Authentication required")]
    Unauthorized,

    /// The actor is known but may not perform the operation.
    #[error("Forbidden: {}", .0.as_str())]
    Forbidden(ForbiddenReason),

    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// The entry date falls in a locked accounting period.
    #[error("Period {period} is locked and cannot be modified")]
    PeriodLocked { period: Period },

    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: {entity_type} {id} from {from} to {to}")]
    InvalidTransition {
        entity_type: String,
        id: String,
        from: String,
        to: String,
    },
}

impl CoreError {
    pub fn not_found(entity_type: &str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            id: id.into(),
        }
    }
}
