//! Dashboard and report handlers.

use axum::extract::{Json, State};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use super::QueryParams;
use crate::services::reports::{self, Dashboard, OutstandingReport};
use crate::AppState;
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Defaults to today (UTC).
    pub date: Option<NaiveDate>,
}

/// GET /dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<DashboardQuery>,
) -> Result<Json<Dashboard>, AppError> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let storage = state.storage.active().await;
    Ok(Json(reports::dashboard(storage.as_ref(), date).await?))
}

/// GET /reports/outstanding
pub async fn outstanding(
    State(state): State<AppState>,
) -> Result<Json<OutstandingReport>, AppError> {
    let storage = state.storage.active().await;
    Ok(Json(reports::outstanding(storage.as_ref()).await?))
}
