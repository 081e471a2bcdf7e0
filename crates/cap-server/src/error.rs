//! HTTP error mapping.
//!
//! Every failure leaves the server as `{"error": <message>, "code": <CODE>}`.
//! Storage failures are logged and reported without detail.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use cap_core::errors::CoreError;
use cap_db::error::DatabaseError;
use cap_workflow::WorkflowError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Rejected(#[from] CoreError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Rejected(e) => Self::Rejected(e),
            WorkflowError::Database(e) => Self::Database(e),
        }
    }
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Rejected(CoreError::Validation(message.into()))
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Rejected(core) => match core {
                CoreError::Validation(_) | CoreError::InvalidTransition { .. } => {
                    StatusCode::BAD_REQUEST
                }
                CoreError::Unauthorized => StatusCode::UNAUTHORIZED,
                CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
                CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                CoreError::PeriodLocked { .. } => StatusCode::LOCKED,
            },
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Rejected(core) => match core {
                CoreError::Validation(_) => "VALIDATION_FAILED",
                CoreError::InvalidTransition { .. } => "INVALID_TRANSITION",
                CoreError::Unauthorized => "UNAUTHORIZED",
                CoreError::Forbidden(reason) => reason.code(),
                CoreError::NotFound { .. } => "NOT_FOUND",
                CoreError::PeriodLocked { .. } => "PERIOD_LOCKED",
            },
            Self::Database(_) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Rejected(core) => core.to_string(),
            Self::Database(err) => {
                tracing::error!(error = %err, "request failed on storage");
                "Internal server error".to_string()
            }
        };
        let body = ErrorResponse {
            error: message,
            code: self.code(),
        };
        (self.status(), Json(body)).into_response()
    }
}
