//! Public site configuration for clients.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    pub site_title: String,
    pub base_url: String,
}

/// Handler for `GET /api/config`
pub async fn config(State(state): State<Arc<AppState>>) -> Json<SiteConfig> {
    Json(SiteConfig {
        site_title: state.config.site_title.clone(),
        base_url: state.config.base_url.clone(),
    })
}
