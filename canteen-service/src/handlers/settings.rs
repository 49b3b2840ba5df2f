//! Storage mode settings.

use axum::extract::{Json, State};
use serde::Deserialize;

use crate::config::StorageBackend;
use crate::services::StorageModeStatus;
use crate::AppState;
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
pub struct SetStorageModeRequest {
    pub mode: StorageBackend,
}

/// GET /settings/storage-mode
pub async fn get_storage_mode(State(state): State<AppState>) -> Json<StorageModeStatus> {
    Json(state.storage.status().await)
}

/// PUT /settings/storage-mode
pub async fn set_storage_mode(
    State(state): State<AppState>,
    Json(req): Json<SetStorageModeRequest>,
) -> Result<Json<StorageModeStatus>, AppError> {
    Ok(Json(state.storage.set_mode(req.mode).await?))
}
