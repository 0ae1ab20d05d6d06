//! PIN verification and status endpoints. Neither requires a PIN.

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::SuccessResponse;
use crate::client::ClientId;
use crate::error::ApiError;
use crate::gate::{evaluate, Denial, GateDecision};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    /// Any JSON value; only strings can be valid
    #[serde(default)]
    pub pin: Option<Value>,
}

/// Handler for `POST /api/verify-pin`
///
/// Locked-out callers are refused without a comparison. Every failed
/// verification counts against the caller; a success clears its history.
pub async fn verify_pin(
    State(state): State<Arc<AppState>>,
    client: ClientId,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Some(pin) = state.config.active_pin() else {
        return Ok(Json(SuccessResponse::ok()));
    };

    let limiter = &state.limiter;
    if let Some(remaining) = limiter.lockout_remaining(client.as_str()) {
        warn!("PIN verification from locked-out client {}", client);
        return Err(ApiError::locked_out(remaining));
    }

    let supplied = match payload {
        Ok(Json(VerifyRequest {
            pin: Some(Value::String(supplied)),
        })) => Some(supplied),
        _ => None,
    };

    match evaluate(Some(pin), supplied.as_deref()) {
        GateDecision::Allowed => {
            limiter.reset(client.as_str());
            info!("PIN verified for {}", client);
            Ok(Json(SuccessResponse::ok()))
        }
        GateDecision::Denied(Denial::InvalidFormat) => {
            limiter.record_failure(client.as_str());
            Err(ApiError::InvalidPinFormat)
        }
        GateDecision::Denied(Denial::Unauthorized) => {
            limiter.record_failure(client.as_str());
            let attempts_left = limiter.attempts_remaining(client.as_str());
            warn!(
                "Failed PIN verification from {} ({} attempt(s) left)",
                client, attempts_left
            );
            Err(ApiError::InvalidPin {
                attempts_left: Some(attempts_left),
            })
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PinStatus {
    pub required: bool,
    pub length: usize,
    pub locked: bool,
}

/// Handler for `GET /api/pin-required`
///
/// Read-only: never counts as an attempt.
pub async fn pin_required(State(state): State<Arc<AppState>>, client: ClientId) -> Json<PinStatus> {
    let status = match state.config.active_pin() {
        Some(pin) => PinStatus {
            required: true,
            length: pin.len(),
            locked: state.limiter.is_locked_out(client.as_str()),
        },
        None => PinStatus {
            required: false,
            length: 0,
            locked: false,
        },
    };
    Json(status)
}
