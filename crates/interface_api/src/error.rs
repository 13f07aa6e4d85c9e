//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_billing::ErrorKind;
use infra_db::{DatabaseError, LedgerError};

use crate::auth::AuthError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Error response body
///
/// `message` summarizes the failure class. `error` carries the detail for
/// client errors; server errors only name their class so storage details
/// stay in the logs.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, detail) = match self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "Not found", detail),
            ApiError::Unauthorized(detail) => (StatusCode::UNAUTHORIZED, "Unauthorized", detail),
            ApiError::Forbidden(detail) => (StatusCode::FORBIDDEN, "Forbidden", detail),
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, "Conflict", detail),
            ApiError::Validation(detail) => (StatusCode::BAD_REQUEST, "Validation failed", detail),
            ApiError::Internal(detail) => {
                error!(error = %detail, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", "internal_error".to_string())
            }
            ApiError::Database(detail) => {
                error!(error = %detail, "Database operation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Database operation failed", "database_error".to_string())
            }
        };

        let body = ErrorResponse {
            message: message.to_string(),
            error: detail,
        };

        (status, Json(body)).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err.kind() {
            Some(ErrorKind::Validation) => ApiError::Validation(err.to_string()),
            Some(ErrorKind::NotFound) => ApiError::NotFound(err.to_string()),
            Some(ErrorKind::Conflict) => ApiError::Conflict(err.to_string()),
            None => ApiError::Database(err.to_string()),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        LedgerError::from(err).into()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Database(err.to_string())
    }
}
