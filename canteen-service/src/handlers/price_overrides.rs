//! Price override and price resolution handlers.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{not_found, QueryParams, ValidatedJson};
use crate::models::{
    CreatePriceOverride, ListPriceOverridesFilter, PriceOverride, UpdatePriceOverride,
};
use crate::services::pricing::{self, ResolvedPrice};
use crate::AppState;
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub employee_id: Uuid,
    pub food_item_id: Uuid,
}

/// GET /price-overrides
pub async fn list_price_overrides(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ListPriceOverridesFilter>,
) -> Result<Json<Vec<PriceOverride>>, AppError> {
    let storage = state.storage.active().await;
    Ok(Json(storage.price_overrides().list(&filter).await?))
}

/// POST /price-overrides
pub async fn create_price_override(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreatePriceOverride>,
) -> Result<(StatusCode, Json<PriceOverride>), AppError> {
    let storage = state.storage.active().await;
    storage
        .food_items()
        .get(req.food_item_id)
        .await?
        .ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("Unknown food item {}", req.food_item_id))
        })?;

    let rule = storage.price_overrides().create(req).await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

/// GET /price-overrides/:id
pub async fn get_price_override(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PriceOverride>, AppError> {
    let storage = state.storage.active().await;
    let rule = storage
        .price_overrides()
        .get(id)
        .await?
        .ok_or_else(|| not_found("Price override"))?;
    Ok(Json(rule))
}

/// PATCH /price-overrides/:id
///
/// Rejects a patch that would leave the override without a company or an
/// employee.
pub async fn update_price_override(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdatePriceOverride>,
) -> Result<Json<PriceOverride>, AppError> {
    let storage = state.storage.active().await;
    let rule = storage
        .price_overrides()
        .update(id, req)
        .await?
        .ok_or_else(|| not_found("Price override"))?;
    Ok(Json(rule))
}

/// DELETE /price-overrides/:id
pub async fn delete_price_override(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let storage = state.storage.active().await;
    if !storage.price_overrides().delete(id).await? {
        return Err(not_found("Price override"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /pricing/resolve?employee_id&food_item_id
pub async fn resolve_price(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ResolveQuery>,
) -> Result<Json<ResolvedPrice>, AppError> {
    let storage = state.storage.active().await;
    let resolved =
        pricing::resolve(storage.as_ref(), query.employee_id, query.food_item_id).await?;
    Ok(Json(resolved))
}
