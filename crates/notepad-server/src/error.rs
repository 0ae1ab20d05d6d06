//! API error type and its HTTP mapping.

use std::time::Duration;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use notepad_store::StoreError;
use serde::Serialize;
use thiserror::Error;

/// Errors returned by API handlers and the PIN gate.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Supplied PIN missing or not 4-10 digits
    #[error("Invalid PIN format")]
    InvalidPinFormat,

    /// Supplied PIN did not match
    #[error("Invalid PIN")]
    InvalidPin { attempts_left: Option<u32> },

    /// Too many failed attempts from this client
    #[error("Too many attempts. Please try again in {minutes} minutes.")]
    LockedOut { minutes: u64 },

    #[error("Notepad not found")]
    NotFound,

    #[error("Cannot delete the default notepad")]
    DefaultProtected,

    /// Malformed request body or id
    #[error("{0}")]
    BadRequest(String),

    /// Storage failure; details are logged, never returned
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Lockout error with the remaining time rounded up to whole minutes.
    pub fn locked_out(remaining: Duration) -> Self {
        let minutes = remaining.as_secs().div_ceil(60).max(1);
        ApiError::LockedOut { minutes }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidPinFormat
            | ApiError::DefaultProtected
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidPin { .. } => StatusCode::UNAUTHORIZED,
            ApiError::LockedOut { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(rename = "attemptsLeft", skip_serializing_if = "Option::is_none")]
    attempts_left: Option<u32>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let attempts_left = match &self {
            ApiError::InvalidPin { attempts_left } => *attempts_left,
            _ => None,
        };
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
            attempts_left,
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { .. } => ApiError::NotFound,
            StoreError::DefaultProtected => ApiError::DefaultProtected,
            StoreError::InvalidId { reason, .. } => ApiError::BadRequest(reason.to_string()),
            e @ (StoreError::Io(_) | StoreError::Serialization(_)) => {
                tracing::error!("Storage error: {}", e);
                ApiError::Internal
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
