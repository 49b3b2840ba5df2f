//! Persistence adapters.
//!
//! Each entity type is served through [`Repository`]; a backend bundles one
//! repository per entity behind [`Storage`]. Handlers never name a backend:
//! they ask the [`StorageSwitch`](crate::services::StorageSwitch) for the
//! active one at the start of every operation.

pub mod local;
pub mod postgres;

pub use local::{LocalCollection, LocalStore};
pub use postgres::Database;

use crate::config::StorageBackend;
use crate::models::{
    Company, CompanyPayment, Employee, EmployeePayment, Entity, FoodItem, FoodTransaction,
    PriceOverride,
};
use crate::services::backup::Backup;
use async_trait::async_trait;
use service_core::error::AppError;
use uuid::Uuid;

/// CRUD contract for one entity type.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// List rows matching `filter`, in the entity's listing order.
    async fn list(&self, filter: &E::Filter) -> Result<Vec<E>, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<E>, AppError>;

    /// Insert a row with a fresh id and timestamps.
    async fn create(&self, input: E::Create) -> Result<E, AppError>;

    /// Apply a partial update. Returns `None` when `id` does not exist.
    async fn update(&self, id: Uuid, update: E::Update) -> Result<Option<E>, AppError>;

    /// Returns `false` when `id` does not exist.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

/// A complete persistence backend.
#[async_trait]
pub trait Storage: Send + Sync {
    fn backend(&self) -> StorageBackend;

    fn companies(&self) -> &dyn Repository<Company>;
    fn employees(&self) -> &dyn Repository<Employee>;
    fn food_items(&self) -> &dyn Repository<FoodItem>;
    fn transactions(&self) -> &dyn Repository<FoodTransaction>;
    fn company_payments(&self) -> &dyn Repository<CompanyPayment>;
    fn employee_payments(&self) -> &dyn Repository<EmployeePayment>;
    fn price_overrides(&self) -> &dyn Repository<PriceOverride>;

    async fn health_check(&self) -> Result<(), AppError>;

    /// Replace every collection present in `backup`, leaving the others alone.
    async fn restore(&self, backup: &Backup) -> Result<(), AppError>;

    /// Remove every row from every collection.
    async fn clear(&self) -> Result<(), AppError>;
}
