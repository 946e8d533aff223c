//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps [`DispatchError`] kinds to HTTP status codes and returns a JSON body
//! carrying the stable error code. Messages of 5xx errors (store outages and
//! rolled-back allocations) are logged and replaced with a generic text
//! before reaching the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use convoy_core::ValidationError;
use convoy_dispatch::{DispatchError, ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "NOT_FOUND", "CONFLICT").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type returned by every handler.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed body, identifier or field value (422).
    #[error("invalid input: {0}")]
    Validation(String),

    /// Record not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The offer cannot make the requested transition (409).
    #[error("{0}")]
    InvalidTransition(String),

    /// Another acceptance won (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The entity store is unreachable (503). Not echoed to clients.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Allocation was rolled back (503). Not echoed to clients.
    #[error("allocation failed: {0}")]
    AllocationFailed(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, ErrorKind::InvalidInput.code()),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, ErrorKind::NotFound.code()),
            Self::InvalidTransition(_) => (StatusCode::CONFLICT, ErrorKind::InvalidTransition.code()),
            Self::Conflict(_) => (StatusCode::CONFLICT, ErrorKind::Conflict.code()),
            Self::StoreUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, ErrorKind::StoreUnavailable.code())
            }
            Self::AllocationFailed(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, ErrorKind::AllocationFailed.code())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
            if matches!(self, Self::AllocationFailed(_)) {
                "Allocation failed and was rolled back".to_string()
            } else {
                "The store is temporarily unavailable".to_string()
            }
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::InvalidInput => Self::Validation(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::InvalidTransition => Self::InvalidTransition(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::StoreUnavailable => Self::StoreUnavailable(message),
            ErrorKind::AllocationFailed => Self::AllocationFailed(message),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}
