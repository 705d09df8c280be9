//! Error types for web handlers.
//!
//! Bridges the domain error taxonomy to HTTP responses via Axum's
//! `IntoResponse`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use todoflow_core::TodoError;

/// Application error type for web handlers.
///
/// Wraps domain errors with an HTTP status and a stable machine-readable
/// code, and renders as a `{code, message}` JSON body.
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code.
    status: StatusCode,
    /// Error message (user-facing).
    message: String,
    /// Error code (for client error handling).
    code: String,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
        }
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE".to_string(),
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}

impl From<TodoError> for AppError {
    fn from(err: TodoError) -> Self {
        match err {
            TodoError::Validation { reason } => Self::bad_request(reason),
            TodoError::NotFound { id } => Self::not_found("todo", id),
            TodoError::StoreUnavailable { reason } => {
                tracing::error!(error = %reason, "Todo store unavailable");
                Self::unavailable("todo store unavailable")
            },
        }
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = %self.status,
                code = %self.code,
                message = %self.message,
                "Server error response"
            );
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn test_domain_error_mapping() {
        let err: AppError = TodoError::NotFound { id: 123 }.into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "[NOT_FOUND] todo with id 123 not found");

        let err: AppError = TodoError::Validation {
            reason: "too long".to_string(),
        }
        .into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err: AppError = TodoError::StoreUnavailable {
            reason: "refused".to_string(),
        }
        .into();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
