//! API error taxonomy shared by all handlers.
//!
//! Every handler failure maps to exactly one of these kinds; the
//! `IntoResponse` impl renders the `{"error": ...}` body clients expect.
//! Cleanup failures in the asset store are never represented here; they are
//! logged at the call site and must not mask the primary error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed required input
    #[error("{0}")]
    Validation(String),

    /// Uniqueness violation (email, slug)
    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    NotFound(String),

    /// Login failure. Deliberately generic: the caller cannot distinguish
    /// an unknown email from a wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No credential presented on a guarded endpoint
    #[error("{0}")]
    Unauthorized(String),

    /// Credential presented but invalid or expired
    #[error("{0}")]
    Forbidden(String),

    /// Upload with a disallowed extension or content type
    #[error("{0}")]
    UnsupportedMedia(String),

    /// Upload over the size limit
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Unclassified persistence or I/O failure
    #[error("{0}")]
    Storage(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Duplicate(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::UnsupportedMedia(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// A panicked or cancelled spawn_blocking task surfaces as a storage error.
impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Storage(format!("Task join: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Duplicate("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("x".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::PayloadTooLarge("x".into()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::Storage("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn credentials_error_is_generic() {
        // Unknown email and wrong password must render identically.
        assert_eq!(ApiError::InvalidCredentials.to_string(), "Invalid credentials");
    }
}
