//! Food item handlers.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{not_found, QueryParams, ValidatedJson};
use crate::models::{CreateFoodItem, FoodItem, ListFoodItemsFilter, UpdateFoodItem};
use crate::AppState;
use service_core::error::AppError;

/// GET /food-items
pub async fn list_food_items(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ListFoodItemsFilter>,
) -> Result<Json<Vec<FoodItem>>, AppError> {
    let storage = state.storage.active().await;
    Ok(Json(storage.food_items().list(&filter).await?))
}

/// POST /food-items
pub async fn create_food_item(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateFoodItem>,
) -> Result<(StatusCode, Json<FoodItem>), AppError> {
    let storage = state.storage.active().await;
    let item = storage.food_items().create(req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /food-items/:id
pub async fn get_food_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FoodItem>, AppError> {
    let storage = state.storage.active().await;
    let item = storage
        .food_items()
        .get(id)
        .await?
        .ok_or_else(|| not_found("Food item"))?;
    Ok(Json(item))
}

/// PATCH /food-items/:id
///
/// A new default price applies to meals recorded afterwards only.
pub async fn update_food_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateFoodItem>,
) -> Result<Json<FoodItem>, AppError> {
    let storage = state.storage.active().await;
    let item = storage
        .food_items()
        .update(id, req)
        .await?
        .ok_or_else(|| not_found("Food item"))?;
    Ok(Json(item))
}

/// DELETE /food-items/:id
pub async fn delete_food_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let storage = state.storage.active().await;
    if !storage.food_items().delete(id).await? {
        return Err(not_found("Food item"));
    }
    Ok(StatusCode::NO_CONTENT)
}
