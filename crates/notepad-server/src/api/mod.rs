//! HTTP handlers.
//!
//! `pin` and `site` are reachable without a PIN; `notepads` and `notes` sit
//! behind [`crate::gate::require_pin`].

pub mod notepads;
pub mod notes;
pub mod pin;
pub mod site;

use serde::Serialize;

/// `{"success": true}`
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
