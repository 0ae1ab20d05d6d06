//! notepad-server: PIN-gated HTTP API over the notepad store.
//!
//! Provides:
//! - PIN verification with per-client lockout
//! - Notepad create / rename / delete / list
//! - Plain-text note read / save

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod gate;
pub mod pin;
pub mod rate_limit;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use notepad_store::{NoteStore, NotepadRegistry};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::rate_limit::RateLimiter;

pub use crate::error::ApiError;

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    pub registry: NotepadRegistry,
    pub notes: NoteStore,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Open the data directory, repairing the registry if needed.
    pub async fn new(config: ServerConfig) -> notepad_store::Result<Self> {
        let notes = NoteStore::new(config.data_dir.clone());
        let registry = NotepadRegistry::new(config.data_dir.clone(), notes.clone());
        registry.init().await?;

        let limiter = Arc::new(RateLimiter::new(config.max_attempts, config.lockout));

        Ok(Self {
            config,
            registry,
            notes,
            limiter,
        })
    }
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/api/notepads", get(api::notepads::list).post(api::notepads::create))
        .route(
            "/api/notepads/{id}",
            put(api::notepads::rename).delete(api::notepads::delete),
        )
        .route("/api/notes/{id}", get(api::notes::read).post(api::notes::save))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::require_pin,
        ));

    Router::new()
        .route("/api/verify-pin", post(api::pin::verify_pin))
        .route("/api/pin-required", get(api::pin::pin_required))
        .route("/api/config", get(api::site::config))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
