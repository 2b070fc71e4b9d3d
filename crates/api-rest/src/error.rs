//! API errors with structured JSON responses.

use api_shared::ErrorBody;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hms_core::HmsError;

pub const SPAM_MESSAGE: &str = "Form not submitted properly";
pub const USER_NOT_FOUND_MESSAGE: &str = "User info not found";

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Form not submitted properly: {0}")]
    Spam(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            ApiError::Spam(detail) => {
                tracing::warn!(detail, "rejected form submission");
                (StatusCode::BAD_REQUEST, "SPAM_DETECTED", SPAM_MESSAGE.to_string())
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "Internal error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody::new(code, message))).into_response()
    }
}

impl From<HmsError> for ApiError {
    fn from(err: HmsError) -> Self {
        match err {
            HmsError::NotFound(message) => ApiError::NotFound(message),
            HmsError::InvalidInput(message) => ApiError::BadRequest(message),
            HmsError::SpamDetected(detail) => ApiError::Spam(detail),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
