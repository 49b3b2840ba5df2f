//! Company and employee payment handlers.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{not_found, QueryParams, ValidatedJson};
use crate::models::{
    CompanyPayment, CreateCompanyPayment, CreateEmployeePayment, EmployeePayment,
    ListCompanyPaymentsFilter, ListEmployeePaymentsFilter, NewEmployeePayment,
    UpdateCompanyPayment, UpdateEmployeePayment,
};
use crate::AppState;
use service_core::error::AppError;

// ============================================================================
// Company payments
// ============================================================================

/// GET /company-payments
pub async fn list_company_payments(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ListCompanyPaymentsFilter>,
) -> Result<Json<Vec<CompanyPayment>>, AppError> {
    let storage = state.storage.active().await;
    Ok(Json(storage.company_payments().list(&filter).await?))
}

/// POST /company-payments
pub async fn create_company_payment(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateCompanyPayment>,
) -> Result<(StatusCode, Json<CompanyPayment>), AppError> {
    let storage = state.storage.active().await;
    storage
        .companies()
        .get(req.company_id)
        .await?
        .ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("Unknown company {}", req.company_id))
        })?;

    let payment = storage.company_payments().create(req).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// GET /company-payments/:id
pub async fn get_company_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CompanyPayment>, AppError> {
    let storage = state.storage.active().await;
    let payment = storage
        .company_payments()
        .get(id)
        .await?
        .ok_or_else(|| not_found("Payment"))?;
    Ok(Json(payment))
}

/// PATCH /company-payments/:id
pub async fn update_company_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateCompanyPayment>,
) -> Result<Json<CompanyPayment>, AppError> {
    let storage = state.storage.active().await;
    let payment = storage
        .company_payments()
        .update(id, req)
        .await?
        .ok_or_else(|| not_found("Payment"))?;
    Ok(Json(payment))
}

/// DELETE /company-payments/:id
pub async fn delete_company_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let storage = state.storage.active().await;
    if !storage.company_payments().delete(id).await? {
        return Err(not_found("Payment"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Employee payments
// ============================================================================

/// GET /employee-payments
pub async fn list_employee_payments(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ListEmployeePaymentsFilter>,
) -> Result<Json<Vec<EmployeePayment>>, AppError> {
    let storage = state.storage.active().await;
    Ok(Json(storage.employee_payments().list(&filter).await?))
}

/// POST /employee-payments
///
/// The payment is booked against the employee's company; a `company_id` in
/// the request must match it.
pub async fn create_employee_payment(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateEmployeePayment>,
) -> Result<(StatusCode, Json<EmployeePayment>), AppError> {
    let storage = state.storage.active().await;
    let employee = storage
        .employees()
        .get(req.employee_id)
        .await?
        .ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("Unknown employee {}", req.employee_id))
        })?;

    if let Some(company_id) = req.company_id {
        if company_id != employee.company_id {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Employee {} does not belong to company {}",
                employee.id,
                company_id
            )));
        }
    }

    let payment = storage
        .employee_payments()
        .create(NewEmployeePayment {
            company_id: employee.company_id,
            input: req,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// GET /employee-payments/:id
pub async fn get_employee_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EmployeePayment>, AppError> {
    let storage = state.storage.active().await;
    let payment = storage
        .employee_payments()
        .get(id)
        .await?
        .ok_or_else(|| not_found("Payment"))?;
    Ok(Json(payment))
}

/// PATCH /employee-payments/:id
pub async fn update_employee_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateEmployeePayment>,
) -> Result<Json<EmployeePayment>, AppError> {
    let storage = state.storage.active().await;
    let payment = storage
        .employee_payments()
        .update(id, req)
        .await?
        .ok_or_else(|| not_found("Payment"))?;
    Ok(Json(payment))
}

/// DELETE /employee-payments/:id
pub async fn delete_employee_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let storage = state.storage.active().await;
    if !storage.employee_payments().delete(id).await? {
        return Err(not_found("Payment"));
    }
    Ok(StatusCode::NO_CONTENT)
}
