//! Application error type and HTTP mapping
//!
//! | Variant | Status | Meaning |
//! |---|---|---|
//! | Validation | 400 | missing/malformed client input |
//! | NotFound | 404 | unknown order id |
//! | Conflict | 409 | request conflicts with the order's current status |
//! | NotConfigured | 503 | provider credentials absent |
//! | Upstream | 502 | payment provider rejected the request |
//! | Store | 500 | database failure |
//! | Internal | 500 | anything else |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error("upstream provider error: {0}")]
    Upstream(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.as_str()),
            AppError::NotConfigured(msg) => {
                warn!(reason = %msg, "Request for unconfigured provider");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Payment provider is not available",
                )
            }
            AppError::Upstream(msg) => {
                error!(error = %msg, "Upstream provider error");
                (StatusCode::BAD_GATEWAY, "Payment provider request failed")
            }
            AppError::Store(msg) => {
                error!(error = %msg, "Store error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
            AppError::Internal(msg) => {
                error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<crate::store::StoreError> for AppError {
    fn from(e: crate::store::StoreError) -> Self {
        AppError::Store(e.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
