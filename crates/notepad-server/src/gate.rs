//! PIN gate applied to every protected route.
//!
//! The decision itself is the pure function [`evaluate`]; [`require_pin`]
//! wraps it as axum middleware and feeds failures into the rate limiter.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::client::ClientId;
use crate::error::ApiError;
use crate::pin::{is_valid_format, Pin};
use crate::AppState;

/// Header carrying the PIN on every protected request.
pub const PIN_HEADER: &str = "x-pin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// Credential missing or malformed (400)
    InvalidFormat,
    /// Credential well-formed but wrong (401)
    Unauthorized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allowed,
    Denied(Denial),
}

/// Decide whether a request presenting `supplied` may proceed.
///
/// Protection is off when no PIN is configured or the configured PIN fails
/// its own format check. A malformed credential is rejected before any
/// comparison takes place.
pub fn evaluate(configured: Option<&Pin>, supplied: Option<&str>) -> GateDecision {
    let Some(pin) = configured.filter(|pin| pin.is_active()) else {
        return GateDecision::Allowed;
    };

    match supplied {
        Some(supplied) if is_valid_format(supplied) => {
            if pin.matches(supplied) {
                GateDecision::Allowed
            } else {
                GateDecision::Denied(Denial::Unauthorized)
            }
        }
        _ => GateDecision::Denied(Denial::InvalidFormat),
    }
}

/// Middleware for protected routes.
///
/// Locked-out clients are refused before comparison, and a wrong PIN counts
/// as a failed attempt, so protected routes cannot sidestep the lockout.
pub async fn require_pin(
    State(state): State<Arc<AppState>>,
    client: ClientId,
    request: Request,
    next: Next,
) -> Response {
    let Some(pin) = state.config.active_pin() else {
        return next.run(request).await;
    };

    if let Some(remaining) = state.limiter.lockout_remaining(client.as_str()) {
        debug!("Rejected request from locked-out client {}", client);
        return ApiError::locked_out(remaining).into_response();
    }

    let supplied = request
        .headers()
        .get(PIN_HEADER)
        .and_then(|v| v.to_str().ok());

    match evaluate(Some(pin), supplied) {
        GateDecision::Allowed => next.run(request).await,
        GateDecision::Denied(Denial::InvalidFormat) => ApiError::InvalidPinFormat.into_response(),
        GateDecision::Denied(Denial::Unauthorized) => {
            state.limiter.record_failure(client.as_str());
            warn!("Wrong PIN on {} from {}", request.uri().path(), client);
            ApiError::InvalidPin {
                attempts_left: None,
            }
            .into_response()
        }
    }
}
