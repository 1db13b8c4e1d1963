//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::chat::ChatError;
use crate::core_state::CoreError;
use crate::intake::IntakeError;

/// Structured error response body for the UI.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("Prescription could not be parsed: {0}")]
    ParseFailed(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Upstream service error: {0}")]
    Upstream(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::UnsupportedMediaType(detail) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "INVALID_FILE_TYPE",
                detail,
            ),
            ApiError::ParseFailed(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "PARSE_FAILED",
                detail,
            ),
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, "INVALID_STATE", detail),
            ApiError::Upstream(detail) => {
                tracing::warn!(detail = %detail, "Upstream service error");
                (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE", detail)
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Intake(e @ IntakeError::InvalidFileType { .. }) => {
                ApiError::UnsupportedMediaType(e.to_string())
            }
            CoreError::Intake(IntakeError::ParseFailed { reason }) => ApiError::ParseFailed(reason),
            CoreError::View(e) => ApiError::Conflict(e.to_string()),
            CoreError::Chat(e) => e.into(),
            CoreError::LockPoisoned => ApiError::Internal("lock poisoned".into()),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyMessage | ChatError::MessageTooLong { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            ChatError::Assistant(e) => ApiError::Upstream(e.to_string()),
            ChatError::LockPoisoned => ApiError::Internal("lock poisoned".into()),
        }
    }
}
