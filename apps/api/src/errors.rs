use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every variant renders as a flat `{"error": ..., "details"?: ...}` object,
/// which is what the browser client reads (`details || error`).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    #[error("{0}")]
    NotConfigured(String),

    #[error("{error}")]
    Upstream {
        status: u16,
        error: String,
        details: Option<String>,
    },

    #[error("{0}")]
    Llm(String),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

/// Body extraction failures are client errors, except an oversized body
/// which keeps its 413.
fn rejected(status: StatusCode, message: String) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(message)
    } else {
        AppError::Validation(message)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        rejected(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        rejected(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        rejected(err.status(), err.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg, None),
            AppError::InvalidApiKey(msg) => (
                StatusCode::UNAUTHORIZED,
                "Invalid API key".to_string(),
                Some(format!(
                    "Your API key is invalid. Please check your key and try again. Error: {msg}"
                )),
            ),
            AppError::NotConfigured(msg) => {
                tracing::error!("Configuration error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg, None)
            }
            AppError::Upstream {
                status,
                error,
                details,
            } => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                tracing::warn!(status = status.as_u16(), "Upstream error: {error}");
                (status, error, details)
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg, None)
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), None)
            }
        };

        let mut body = Map::new();
        body.insert("error".to_string(), Value::String(error));
        if let Some(details) = details {
            body.insert("details".to_string(), Value::String(details));
        }

        (status, Json(Value::Object(body))).into_response()
    }
}

/// Shorthand for the `{"error": msg}` body used outside `AppError`.
pub fn error_body(message: &str) -> Json<Value> {
    Json(json!({ "error": message }))
}
