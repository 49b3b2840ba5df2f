//! Services module for canteen-service.

pub mod backup;
pub mod balance;
pub mod entry;
pub mod metrics;
pub mod pricing;
pub mod reports;
pub mod storage;
pub mod switch;

pub use metrics::{init_metrics, record_error, record_meals, record_storage_operation};
pub use storage::{Database, LocalStore, Repository, Storage};
pub use switch::{StorageModeStatus, StorageSwitch};
