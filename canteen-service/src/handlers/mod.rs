//! HTTP handlers for canteen-service.

pub mod backup;
pub mod companies;
pub mod employees;
pub mod extract;
pub mod food_items;
pub mod health;
pub mod payments;
pub mod price_overrides;
pub mod reports;
pub mod settings;
pub mod transactions;

pub use extract::{QueryParams, ValidatedJson};

use service_core::error::AppError;

pub(crate) fn not_found(what: &str) -> AppError {
    AppError::NotFound(anyhow::anyhow!("{} not found", what))
}
