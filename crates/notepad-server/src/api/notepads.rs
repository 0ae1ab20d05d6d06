//! Notepad registry endpoints.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use notepad_store::{Notepad, Registry};
use serde::Deserialize;

use super::SuccessResponse;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CreateRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

/// Handler for `GET /api/notepads`
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Registry>, ApiError> {
    Ok(Json(state.registry.list().await?))
}

/// Handler for `POST /api/notepads`
///
/// The body is optional; `{"name": "..."}` overrides the generated name.
pub async fn create(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Notepad>, ApiError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        CreateRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?
    };

    Ok(Json(state.registry.create(request.name).await?))
}

/// Handler for `PUT /api/notepads/{id}`
pub async fn rename(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<RenameRequest>, JsonRejection>,
) -> Result<Json<Notepad>, ApiError> {
    let Json(request) = payload?;
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }

    Ok(Json(state.registry.rename(&id, name.to_string()).await?))
}

/// Handler for `DELETE /api/notepads/{id}`
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.registry.delete(&id).await?;
    Ok(Json(SuccessResponse::ok()))
}
