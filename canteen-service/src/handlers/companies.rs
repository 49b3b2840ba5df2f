//! Company handlers.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::{not_found, QueryParams, ValidatedJson};
use crate::models::{Company, CreateCompany, ListCompaniesFilter, UpdateCompany};
use crate::services::balance::{load_company_balance, Balance, EmployeeSummary};
use crate::services::reports::{self, CompanyStatement};
use crate::AppState;
use service_core::error::AppError;

/// Statement period, both ends inclusive.
#[derive(Debug, Deserialize)]
pub struct StatementQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// GET /companies
pub async fn list_companies(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ListCompaniesFilter>,
) -> Result<Json<Vec<Company>>, AppError> {
    let storage = state.storage.active().await;
    let companies = storage.companies().list(&filter).await?;
    Ok(Json(companies))
}

/// POST /companies
pub async fn create_company(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateCompany>,
) -> Result<(StatusCode, Json<Company>), AppError> {
    let storage = state.storage.active().await;
    let company = storage.companies().create(req).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

/// GET /companies/:id
pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Company>, AppError> {
    let storage = state.storage.active().await;
    let company = storage
        .companies()
        .get(id)
        .await?
        .ok_or_else(|| not_found("Company"))?;
    Ok(Json(company))
}

/// PATCH /companies/:id
pub async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateCompany>,
) -> Result<Json<Company>, AppError> {
    let storage = state.storage.active().await;
    let company = storage
        .companies()
        .update(id, req)
        .await?
        .ok_or_else(|| not_found("Company"))?;
    Ok(Json(company))
}

/// DELETE /companies/:id
///
/// Employees, transactions and payments of the company are kept.
pub async fn delete_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let storage = state.storage.active().await;
    if !storage.companies().delete(id).await? {
        return Err(not_found("Company"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /companies/:id/balance
pub async fn company_balance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Balance>, AppError> {
    let storage = state.storage.active().await;
    storage
        .companies()
        .get(id)
        .await?
        .ok_or_else(|| not_found("Company"))?;

    let balance = load_company_balance(storage.as_ref(), id).await?;
    Ok(Json(balance))
}

/// GET /companies/:id/employees
pub async fn company_employees(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<EmployeeSummary>>, AppError> {
    let storage = state.storage.active().await;
    let employees = reports::load_company_employees(storage.as_ref(), id).await?;
    Ok(Json(employees))
}

/// GET /companies/:id/statement?from&to
pub async fn company_statement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    QueryParams(period): QueryParams<StatementQuery>,
) -> Result<Json<CompanyStatement>, AppError> {
    let storage = state.storage.active().await;
    let statement =
        reports::company_statement(storage.as_ref(), id, period.from, period.to).await?;
    Ok(Json(statement))
}
