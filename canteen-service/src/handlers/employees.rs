//! Employee handlers.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{not_found, QueryParams, ValidatedJson};
use crate::models::{CreateEmployee, Employee, ListEmployeesFilter, UpdateEmployee};
use crate::services::balance::{load_employee_balance, Balance, EmployeeSummary};
use crate::services::reports;
use crate::services::Storage;
use crate::AppState;
use service_core::error::AppError;

async fn ensure_company(storage: &dyn Storage, company_id: Uuid) -> Result<(), AppError> {
    storage
        .companies()
        .get(company_id)
        .await?
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Unknown company {}", company_id)))?;
    Ok(())
}

/// GET /employees
pub async fn list_employees(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ListEmployeesFilter>,
) -> Result<Json<Vec<Employee>>, AppError> {
    let storage = state.storage.active().await;
    let employees = storage.employees().list(&filter).await?;
    Ok(Json(employees))
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub company_id: Option<Uuid>,
}

/// GET /employees/summary?company_id
///
/// Every employee with company name and balance.
pub async fn employee_summaries(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<SummaryQuery>,
) -> Result<Json<Vec<EmployeeSummary>>, AppError> {
    let storage = state.storage.active().await;
    let summaries = reports::load_employee_summaries(storage.as_ref(), query.company_id).await?;
    Ok(Json(summaries))
}

/// POST /employees
pub async fn create_employee(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateEmployee>,
) -> Result<(StatusCode, Json<Employee>), AppError> {
    let storage = state.storage.active().await;
    ensure_company(storage.as_ref(), req.company_id).await?;

    let employee = storage.employees().create(req).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

/// GET /employees/:id
pub async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Employee>, AppError> {
    let storage = state.storage.active().await;
    let employee = storage
        .employees()
        .get(id)
        .await?
        .ok_or_else(|| not_found("Employee"))?;
    Ok(Json(employee))
}

/// PATCH /employees/:id
pub async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateEmployee>,
) -> Result<Json<Employee>, AppError> {
    let storage = state.storage.active().await;
    if let Some(company_id) = req.company_id {
        ensure_company(storage.as_ref(), company_id).await?;
    }

    let employee = storage
        .employees()
        .update(id, req)
        .await?
        .ok_or_else(|| not_found("Employee"))?;
    Ok(Json(employee))
}

/// DELETE /employees/:id
pub async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let storage = state.storage.active().await;
    if !storage.employees().delete(id).await? {
        return Err(not_found("Employee"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /employees/:id/balance
pub async fn employee_balance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Balance>, AppError> {
    let storage = state.storage.active().await;
    storage
        .employees()
        .get(id)
        .await?
        .ok_or_else(|| not_found("Employee"))?;

    let balance = load_employee_balance(storage.as_ref(), id).await?;
    Ok(Json(balance))
}
