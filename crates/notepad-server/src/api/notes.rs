//! Note content endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::SuccessResponse;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct NoteContent {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub content: String,
}

/// Handler for `GET /api/notes/{id}`
pub async fn read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<NoteContent>, ApiError> {
    let content = state.notes.read(&id).await?;
    Ok(Json(NoteContent { content }))
}

/// Handler for `POST /api/notes/{id}`
pub async fn save(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<SaveRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(request) = payload?;
    state.notes.write(&id, &request.content).await?;
    tracing::debug!("Saved note {} ({} bytes)", id, request.content.len());
    Ok(Json(SuccessResponse::ok()))
}
