//! Backup, restore and clear handlers.

use axum::{
    body::Bytes,
    extract::{Json, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use serde_json::json;

use crate::services::backup;
use crate::services::record_error;
use crate::AppState;
use service_core::error::AppError;

/// GET /backup/export
pub async fn export_backup(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let storage = state.storage.active().await;
    let document = backup::export(storage.as_ref()).await?;

    let filename = format!(
        "attachment; filename=\"canteen-backup-{}.json\"",
        document
            .exported_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    );
    Ok(([(header::CONTENT_DISPOSITION, filename)], Json(document)))
}

/// POST /backup/import
///
/// The whole document is validated before anything is written.
pub async fn import_backup(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let storage = state.storage.active().await;
    let restored = backup::import(storage.as_ref(), &body).await.map_err(|e| {
        record_error(e.kind(), "import_backup");
        e
    })?;

    Ok(Json(json!({
        "backend": storage.backend(),
        "imported": restored.counts(),
    })))
}

/// DELETE /backup
///
/// Wipes every collection of the active backend.
pub async fn clear_data(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    let storage = state.storage.active().await;
    storage.clear().await?;
    tracing::warn!(backend = %storage.backend(), "All data cleared");
    Ok(StatusCode::NO_CONTENT)
}
