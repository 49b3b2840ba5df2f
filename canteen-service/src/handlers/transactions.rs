//! Food transaction handlers.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{not_found, QueryParams, ValidatedJson};
use crate::models::{FoodTransaction, ListTransactionsFilter, UpdateFoodTransaction};
use crate::services::entry::{self, RecordMeals, RecordedMeal};
use crate::services::record_error;
use crate::AppState;
use service_core::error::AppError;

/// GET /transactions
pub async fn list_transactions(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ListTransactionsFilter>,
) -> Result<Json<Vec<FoodTransaction>>, AppError> {
    let storage = state.storage.active().await;
    Ok(Json(storage.transactions().list(&filter).await?))
}

/// Record a day's meals.
///
/// POST /transactions
pub async fn record_meals(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RecordMeals>,
) -> Result<(StatusCode, Json<Vec<RecordedMeal>>), AppError> {
    let storage = state.storage.active().await;
    let recorded = entry::record(storage.as_ref(), req).await.map_err(|e| {
        record_error(e.kind(), "record_meals");
        e
    })?;
    Ok((StatusCode::CREATED, Json(recorded)))
}

/// GET /transactions/:id
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FoodTransaction>, AppError> {
    let storage = state.storage.active().await;
    let transaction = storage
        .transactions()
        .get(id)
        .await?
        .ok_or_else(|| not_found("Transaction"))?;
    Ok(Json(transaction))
}

/// PATCH /transactions/:id
pub async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateFoodTransaction>,
) -> Result<Json<FoodTransaction>, AppError> {
    let storage = state.storage.active().await;
    let transaction = storage
        .transactions()
        .update(id, req)
        .await?
        .ok_or_else(|| not_found("Transaction"))?;
    Ok(Json(transaction))
}

/// DELETE /transactions/:id
pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let storage = state.storage.active().await;
    if !storage.transactions().delete(id).await? {
        return Err(not_found("Transaction"));
    }
    Ok(StatusCode::NO_CONTENT)
}
