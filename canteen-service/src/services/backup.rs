//! JSON backup and restore of every collection.

use crate::models::{
    Company, CompanyPayment, Employee, EmployeePayment, Entity, FoodItem, FoodTransaction,
    ListCompaniesFilter, ListCompanyPaymentsFilter, ListEmployeePaymentsFilter,
    ListEmployeesFilter, ListFoodItemsFilter, ListPriceOverridesFilter, ListTransactionsFilter,
    PriceOverride,
};
use crate::services::storage::Storage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{info, instrument};

/// Backup document. A collection that is absent on import is left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companies: Option<Vec<Company>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employees: Option<Vec<Employee>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_items: Option<Vec<FoodItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<FoodTransaction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_payments: Option<Vec<CompanyPayment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_payments: Option<Vec<EmployeePayment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_overrides: Option<Vec<PriceOverride>>,
    #[serde(default)]
    pub exported_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Malformed backup document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Backup document contains no collections")]
    Empty,

    #[error("Duplicate id {id} in {collection}")]
    DuplicateId {
        collection: &'static str,
        id: uuid::Uuid,
    },
}

impl From<BackupError> for AppError {
    fn from(err: BackupError) -> Self {
        AppError::BadRequest(anyhow::Error::new(err))
    }
}

fn check_unique<E: Entity>(rows: Option<&Vec<E>>) -> Result<(), BackupError> {
    let mut seen = HashSet::new();
    for row in rows.into_iter().flatten() {
        if !seen.insert(row.id()) {
            return Err(BackupError::DuplicateId {
                collection: E::COLLECTION,
                id: row.id(),
            });
        }
    }
    Ok(())
}

impl Backup {
    /// Parse and validate a whole document. Nothing is written on error.
    pub fn parse(data: &[u8]) -> Result<Self, BackupError> {
        let backup: Backup = serde_json::from_slice(data)?;

        if backup.is_empty() {
            return Err(BackupError::Empty);
        }

        check_unique(backup.companies.as_ref())?;
        check_unique(backup.employees.as_ref())?;
        check_unique(backup.food_items.as_ref())?;
        check_unique(backup.transactions.as_ref())?;
        check_unique(backup.company_payments.as_ref())?;
        check_unique(backup.employee_payments.as_ref())?;
        check_unique(backup.price_overrides.as_ref())?;

        Ok(backup)
    }

    fn is_empty(&self) -> bool {
        self.companies.is_none()
            && self.employees.is_none()
            && self.food_items.is_none()
            && self.transactions.is_none()
            && self.company_payments.is_none()
            && self.employee_payments.is_none()
            && self.price_overrides.is_none()
    }

    /// Row counts per collection, keyed like the document.
    pub fn counts(&self) -> serde_json::Value {
        fn len<T>(rows: &Option<Vec<T>>) -> Option<usize> {
            rows.as_ref().map(Vec::len)
        }
        serde_json::json!({
            "companies": len(&self.companies),
            "employees": len(&self.employees),
            "foodItems": len(&self.food_items),
            "transactions": len(&self.transactions),
            "companyPayments": len(&self.company_payments),
            "employeePayments": len(&self.employee_payments),
            "priceOverrides": len(&self.price_overrides),
        })
    }
}

/// Snapshot every collection of `storage`.
#[instrument(skip(storage))]
pub async fn export(storage: &dyn Storage) -> Result<Backup, AppError> {
    let company_filter = ListCompaniesFilter::default();
    let employee_filter = ListEmployeesFilter::default();
    let food_item_filter = ListFoodItemsFilter::default();
    let transaction_filter = ListTransactionsFilter::default();
    let company_payment_filter = ListCompanyPaymentsFilter::default();
    let employee_payment_filter = ListEmployeePaymentsFilter::default();
    let override_filter = ListPriceOverridesFilter::default();

    let (companies, employees, food_items, transactions) = futures::try_join!(
        storage.companies().list(&company_filter),
        storage.employees().list(&employee_filter),
        storage.food_items().list(&food_item_filter),
        storage.transactions().list(&transaction_filter),
    )?;
    let (company_payments, employee_payments, price_overrides) = futures::try_join!(
        storage.company_payments().list(&company_payment_filter),
        storage.employee_payments().list(&employee_payment_filter),
        storage.price_overrides().list(&override_filter),
    )?;

    let backup = Backup {
        companies: Some(companies),
        employees: Some(employees),
        food_items: Some(food_items),
        transactions: Some(transactions),
        company_payments: Some(company_payments),
        employee_payments: Some(employee_payments),
        price_overrides: Some(price_overrides),
        exported_at: Some(Utc::now()),
    };

    info!(backend = %storage.backend(), counts = %backup.counts(), "Backup exported");
    Ok(backup)
}

/// Parse `data` and restore it into `storage`, failing closed on bad input.
#[instrument(skip(storage, data), fields(bytes = data.len()))]
pub async fn import(storage: &dyn Storage, data: &[u8]) -> Result<Backup, AppError> {
    let backup = Backup::parse(data)?;
    storage.restore(&backup).await?;
    info!(backend = %storage.backend(), counts = %backup.counts(), "Backup imported");
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::LocalStore;
    use crate::models::{CreateCompany, CreateFoodItem};

    #[test]
    fn test_uses_camel_case_collection_keys() {
        let backup = Backup {
            food_items: Some(vec![]),
            company_payments: Some(vec![]),
            exported_at: Some(Utc::now()),
            ..Default::default()
        };
        let value = serde_json::to_value(&backup).unwrap();

        assert!(value.get("foodItems").is_some());
        assert!(value.get("companyPayments").is_some());
        assert!(value.get("exportedAt").is_some());
        assert!(value.get("companies").is_none());
    }

    #[test]
    fn test_malformed_document_is_rejected() {
        assert!(matches!(
            Backup::parse(b"{\"companies\": [{\"name\": 1}]}"),
            Err(BackupError::Malformed(_))
        ));
        assert!(matches!(Backup::parse(b"not json"), Err(BackupError::Malformed(_))));
        assert!(matches!(Backup::parse(b"{}"), Err(BackupError::Empty)));
    }

    #[tokio::test]
    async fn test_export_then_import_into_empty_store() {
        let source_dir = tempfile::tempdir().unwrap();
        let source = LocalStore::new(source_dir.path()).await.unwrap();
        let company: CreateCompany =
            serde_json::from_value(serde_json::json!({ "name": "Acme Corp" })).unwrap();
        let item: CreateFoodItem =
            serde_json::from_value(serde_json::json!({ "name": "Tea", "default_price": "20" }))
                .unwrap();
        source.companies().create(company).await.unwrap();
        source.food_items().create(item).await.unwrap();

        let backup = export(&source).await.unwrap();
        let data = serde_json::to_vec(&backup).unwrap();

        let target_dir = tempfile::tempdir().unwrap();
        let target = LocalStore::new(target_dir.path()).await.unwrap();
        import(&target, &data).await.unwrap();

        let reexported = export(&target).await.unwrap();
        assert_eq!(reexported.companies, backup.companies);
        assert_eq!(reexported.food_items, backup.food_items);
        assert_eq!(reexported.transactions, Some(vec![]));
    }

    #[tokio::test]
    async fn test_failed_import_leaves_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();
        let company: CreateCompany =
            serde_json::from_value(serde_json::json!({ "name": "Acme Corp" })).unwrap();
        store.companies().create(company).await.unwrap();

        let result = import(&store, b"{\"companies\": [], \"employees\": 7}").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let rows = store
            .companies()
            .list(&ListCompaniesFilter::default())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }
}
