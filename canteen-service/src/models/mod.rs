//! Domain models for canteen-service.
//!
//! Every persisted row implements [`Entity`], which carries the pieces of
//! behaviour both storage backends share: building a row from its create
//! input, applying a partial update, matching a list filter and ordering a
//! listing. Keeping these here means the local and remote adapters agree on
//! update and list semantics by construction.

mod company;
mod employee;
mod food_item;
mod payment;
mod price_override;
mod transaction;

pub use company::{Company, CreateCompany, ListCompaniesFilter, UpdateCompany};
pub use employee::{
    CreateEmployee, Employee, EmployeeStatus, ListEmployeesFilter, UpdateEmployee,
};
pub use food_item::{CreateFoodItem, FoodItem, ListFoodItemsFilter, UpdateFoodItem};
pub use payment::{
    CompanyPayment, CreateCompanyPayment, CreateEmployeePayment, EmployeePayment,
    ListCompanyPaymentsFilter, ListEmployeePaymentsFilter, NewEmployeePayment, PaymentMethod,
    UpdateCompanyPayment, UpdateEmployeePayment,
};
pub use price_override::{
    CreatePriceOverride, ListPriceOverridesFilter, PriceOverride, UpdatePriceOverride,
};
pub use transaction::{
    CreateFoodTransaction, FoodTransaction, ListTransactionsFilter, UpdateFoodTransaction,
};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use service_core::error::AppError;
use std::cmp::Ordering;
use uuid::Uuid;
use validator::ValidationError;

/// Most decimal places a money value may carry.
pub(crate) const MONEY_SCALE: u32 = 2;

/// Largest single price or payment: 9,999,999,999.99.
pub(crate) fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, MONEY_SCALE)
}

/// A persisted row type.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    /// Fields supplied by the caller on creation.
    type Create: Send + Sync;
    /// Partial update; `None` leaves a field untouched.
    type Update: Send + Sync;
    /// List filter; `Default` lists everything.
    type Filter: Default + Send + Sync;

    /// Collection name, used as the local document name and in metrics.
    const COLLECTION: &'static str;

    fn id(&self) -> Uuid;

    /// Build a new row, assigning identity and timestamps.
    fn from_create(input: Self::Create, id: Uuid, now: DateTime<Utc>) -> Result<Self, AppError>;

    /// Apply a partial update and refresh `updated_at`.
    ///
    /// Runs inside the adapter's write lock or transaction, so a rejected
    /// merge leaves the stored row untouched.
    fn apply_update(&mut self, update: Self::Update, now: DateTime<Utc>) -> Result<(), AppError>;

    fn matches(&self, filter: &Self::Filter) -> bool;

    /// Listing order.
    fn ordering(a: &Self, b: &Self) -> Ordering;
}

/// Sort a listing with the entity's ordering.
pub fn sort_entities<E: Entity>(records: &mut [E]) {
    records.sort_by(E::ordering);
}

/// Deserialize a field that distinguishes "absent" from "explicitly null".
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>`: absent gives `None`, `null` gives `Some(None)`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn money(value: &Decimal) -> Result<(), ValidationError> {
    if value.normalize().scale() > MONEY_SCALE {
        let mut err = ValidationError::new("money_scale");
        err.message = Some("must have at most 2 decimal places".into());
        return Err(err);
    }
    if *value > max_amount() {
        let mut err = ValidationError::new("money_range");
        err.message = Some("must not exceed 9999999999.99".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    money(value)?;
    if *value < Decimal::ZERO {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("must not be negative".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn positive(value: &Decimal) -> Result<(), ValidationError> {
    money(value)?;
    if *value <= Decimal::ZERO {
        let mut err = ValidationError::new("positive");
        err.message = Some("must be greater than zero".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn default_true() -> bool {
    true
}

/// Inclusive date-range check used by dated filters.
pub(crate) fn within(date: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    from.map_or(true, |f| date >= f) && to.map_or(true, |t| date <= t)
}

/// Case-insensitive name ordering with a stable tiebreak on id.
pub(crate) fn by_name(a: &str, a_id: Uuid, b: &str, b_id: Uuid) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
        .then_with(|| a_id.cmp(&b_id))
}
