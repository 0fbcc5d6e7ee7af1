use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::shared::types::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Requested lifecycle change is not in the transition table
    #[error("Invalid transition: cannot {action} a study in status '{status}'")]
    InvalidTransition { status: String, action: String },

    /// Precondition for an operation is not met
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Scoring job returned non-2xx or failed in transport
    #[error("External call failed: {0}")]
    ExternalCallFailed(String),

    /// Scoring job wait was timed out or cancelled locally
    #[error("External call cancelled: {0}")]
    ExternalCallCancelled(String),

    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            other => AppError::PersistenceUnavailable(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Validation(ref msg) => (
                StatusCode::BAD_REQUEST,
                msg.clone(),
                Some(vec![msg.clone()]),
            ),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Auth(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::Unauthorized(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::NotAuthorized(ref msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, msg.clone(), None),
            AppError::InvalidTransition { .. } => {
                (StatusCode::CONFLICT, self.to_string(), None)
            }
            AppError::InvalidState(ref msg) => (StatusCode::CONFLICT, msg.clone(), None),
            AppError::ExternalCallFailed(ref msg) => {
                tracing::error!("Scoring job failed: {}", msg);
                (StatusCode::BAD_GATEWAY, msg.clone(), None)
            }
            AppError::ExternalCallCancelled(ref msg) => {
                (StatusCode::CONFLICT, msg.clone(), None)
            }
            AppError::PersistenceUnavailable(ref msg) => {
                tracing::error!("Persistence unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Persistence unavailable".to_string(),
                    None,
                )
            }
            AppError::Storage(ref msg) => {
                tracing::error!("Storage error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Document storage error".to_string(),
                    None,
                )
            }
        };

        let body = Json(ApiResponse::<()>::error(Some(message), errors));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
