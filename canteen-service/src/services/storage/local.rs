//! Local storage backend: one JSON document per collection in a directory.

use super::{Repository, Storage};
use crate::config::StorageBackend;
use crate::models::{
    sort_entities, Company, CompanyPayment, Employee, EmployeePayment, Entity, FoodItem,
    FoodTransaction, PriceOverride,
};
use crate::services::backup::Backup;
use crate::services::metrics::{record_storage_operation, STORAGE_OPERATION_DURATION};
use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

const BACKEND: &str = "local";

/// A single collection stored as a JSON array in `<dir>/<collection>.json`.
///
/// Reads never fail: a missing or unreadable document is an empty
/// collection. Mutations hold the collection lock across read-modify-write
/// and replace the document atomically through a rename.
pub struct LocalCollection<E: Entity> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> LocalCollection<E> {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{}.json", E::COLLECTION)),
            write_lock: Mutex::new(()),
            _entity: PhantomData,
        }
    }

    async fn load(&self) -> Vec<E> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(
                    collection = E::COLLECTION,
                    error = %e,
                    "Failed to read collection, treating as empty"
                );
                return Vec::new();
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(
                    collection = E::COLLECTION,
                    error = %e,
                    "Corrupt collection document, treating as empty"
                );
                Vec::new()
            }
        }
    }

    fn encode(rows: &[E]) -> Result<Vec<u8>, AppError> {
        serde_json::to_vec(rows).map_err(|e| {
            AppError::StorageError(anyhow::anyhow!(
                "Failed to encode {}: {}",
                E::COLLECTION,
                e
            ))
        })
    }

    async fn save(&self, rows: &[E]) -> Result<(), AppError> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, Self::encode(rows)?).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Write `rows` beside the live document without touching it.
    /// The caller holds the write lock until the staged file is swapped in.
    async fn stage(&self, rows: Option<&[E]>, staged: &mut Vec<Staged>) -> Result<(), AppError> {
        let Some(rows) = rows else {
            return Ok(());
        };
        let path = self.path.with_extension("json.staged");
        fs::write(&path, Self::encode(rows)?).await?;
        staged.push(Staged {
            collection: E::COLLECTION,
            staged: path,
            live: self.path.clone(),
            count: rows.len(),
        });
        Ok(())
    }

    fn timer(&self, operation: &str) -> prometheus::HistogramTimer {
        STORAGE_OPERATION_DURATION
            .with_label_values(&[BACKEND, E::COLLECTION, operation])
            .start_timer()
    }
}

#[async_trait]
impl<E: Entity> Repository<E> for LocalCollection<E> {
    #[instrument(skip(self, filter), fields(collection = E::COLLECTION))]
    async fn list(&self, filter: &E::Filter) -> Result<Vec<E>, AppError> {
        let timer = self.timer("list");

        let mut rows: Vec<E> = self
            .load()
            .await
            .into_iter()
            .filter(|row| row.matches(filter))
            .collect();
        sort_entities(&mut rows);

        timer.observe_duration();
        record_storage_operation(BACKEND, E::COLLECTION, "list");
        Ok(rows)
    }

    #[instrument(skip(self), fields(collection = E::COLLECTION))]
    async fn get(&self, id: Uuid) -> Result<Option<E>, AppError> {
        let timer = self.timer("get");
        let row = self.load().await.into_iter().find(|row| row.id() == id);
        timer.observe_duration();
        Ok(row)
    }

    #[instrument(skip(self, input), fields(collection = E::COLLECTION))]
    async fn create(&self, input: E::Create) -> Result<E, AppError> {
        let timer = self.timer("create");
        let _guard = self.write_lock.lock().await;

        let mut rows = self.load().await;
        let row = E::from_create(input, Uuid::new_v4(), Utc::now())?;
        rows.push(row.clone());
        self.save(&rows).await?;

        timer.observe_duration();
        record_storage_operation(BACKEND, E::COLLECTION, "create");
        info!(collection = E::COLLECTION, id = %row.id(), "Record created");
        Ok(row)
    }

    #[instrument(skip(self, update), fields(collection = E::COLLECTION))]
    async fn update(&self, id: Uuid, update: E::Update) -> Result<Option<E>, AppError> {
        let timer = self.timer("update");
        let _guard = self.write_lock.lock().await;

        let mut rows = self.load().await;
        let Some(row) = rows.iter_mut().find(|row| row.id() == id) else {
            return Ok(None);
        };
        row.apply_update(update, Utc::now())?;
        let updated = row.clone();
        self.save(&rows).await?;

        timer.observe_duration();
        record_storage_operation(BACKEND, E::COLLECTION, "update");
        info!(collection = E::COLLECTION, id = %id, "Record updated");
        Ok(Some(updated))
    }

    #[instrument(skip(self), fields(collection = E::COLLECTION))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let timer = self.timer("delete");
        let _guard = self.write_lock.lock().await;

        let mut rows = self.load().await;
        let before = rows.len();
        rows.retain(|row| row.id() != id);
        if rows.len() == before {
            return Ok(false);
        }
        self.save(&rows).await?;

        timer.observe_duration();
        record_storage_operation(BACKEND, E::COLLECTION, "delete");
        info!(collection = E::COLLECTION, id = %id, "Record deleted");
        Ok(true)
    }
}

/// A collection document written next to the live one, awaiting rename.
struct Staged {
    collection: &'static str,
    staged: PathBuf,
    live: PathBuf,
    count: usize,
}

/// All seven collections under one directory.
pub struct LocalStore {
    dir: PathBuf,
    companies: LocalCollection<Company>,
    employees: LocalCollection<Employee>,
    food_items: LocalCollection<FoodItem>,
    transactions: LocalCollection<FoodTransaction>,
    company_payments: LocalCollection<CompanyPayment>,
    employee_payments: LocalCollection<EmployeePayment>,
    price_overrides: LocalCollection<PriceOverride>,
}

impl LocalStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::StorageError(anyhow::anyhow!(
                "Failed to create data directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        info!(path = %dir.display(), "Local store opened");

        Ok(Self {
            companies: LocalCollection::new(&dir),
            employees: LocalCollection::new(&dir),
            food_items: LocalCollection::new(&dir),
            transactions: LocalCollection::new(&dir),
            company_payments: LocalCollection::new(&dir),
            employee_payments: LocalCollection::new(&dir),
            price_overrides: LocalCollection::new(&dir),
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl LocalStore {
    /// Replace every collection present in `backup`.
    ///
    /// All write locks are held throughout. Every document is staged before
    /// the first rename, so a failed write leaves the live data untouched.
    async fn swap_in(&self, backup: &Backup) -> Result<(), AppError> {
        let _locks = (
            self.companies.write_lock.lock().await,
            self.employees.write_lock.lock().await,
            self.food_items.write_lock.lock().await,
            self.transactions.write_lock.lock().await,
            self.company_payments.write_lock.lock().await,
            self.employee_payments.write_lock.lock().await,
            self.price_overrides.write_lock.lock().await,
        );

        let mut staged = Vec::new();
        if let Err(e) = self.stage_all(backup, &mut staged).await {
            for doc in &staged {
                fs::remove_file(&doc.staged).await.ok();
            }
            warn!(error = %e, "Staging failed, live collections left untouched");
            return Err(e);
        }

        for doc in staged {
            fs::rename(&doc.staged, &doc.live).await?;
            info!(collection = doc.collection, count = doc.count, "Collection replaced");
        }
        Ok(())
    }

    async fn stage_all(&self, backup: &Backup, staged: &mut Vec<Staged>) -> Result<(), AppError> {
        self.companies.stage(backup.companies.as_deref(), staged).await?;
        self.employees.stage(backup.employees.as_deref(), staged).await?;
        self.food_items.stage(backup.food_items.as_deref(), staged).await?;
        self.transactions.stage(backup.transactions.as_deref(), staged).await?;
        self.company_payments.stage(backup.company_payments.as_deref(), staged).await?;
        self.employee_payments.stage(backup.employee_payments.as_deref(), staged).await?;
        self.price_overrides.stage(backup.price_overrides.as_deref(), staged).await?;
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Local
    }

    fn companies(&self) -> &dyn Repository<Company> {
        &self.companies
    }

    fn employees(&self) -> &dyn Repository<Employee> {
        &self.employees
    }

    fn food_items(&self) -> &dyn Repository<FoodItem> {
        &self.food_items
    }

    fn transactions(&self) -> &dyn Repository<FoodTransaction> {
        &self.transactions
    }

    fn company_payments(&self) -> &dyn Repository<CompanyPayment> {
        &self.company_payments
    }

    fn employee_payments(&self) -> &dyn Repository<EmployeePayment> {
        &self.employee_payments
    }

    fn price_overrides(&self) -> &dyn Repository<PriceOverride> {
        &self.price_overrides
    }

    async fn health_check(&self) -> Result<(), AppError> {
        let meta = fs::metadata(&self.dir).await.map_err(|e| {
            AppError::StorageError(anyhow::anyhow!("Data directory unavailable: {}", e))
        })?;
        if !meta.is_dir() {
            return Err(AppError::StorageError(anyhow::anyhow!(
                "{} is not a directory",
                self.dir.display()
            )));
        }
        Ok(())
    }

    #[instrument(skip(self, backup))]
    async fn restore(&self, backup: &Backup) -> Result<(), AppError> {
        self.swap_in(backup).await?;
        info!("Local store restored from backup");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<(), AppError> {
        let empty = Backup {
            companies: Some(Vec::new()),
            employees: Some(Vec::new()),
            food_items: Some(Vec::new()),
            transactions: Some(Vec::new()),
            company_payments: Some(Vec::new()),
            employee_payments: Some(Vec::new()),
            price_overrides: Some(Vec::new()),
            exported_at: None,
        };
        self.swap_in(&empty).await?;
        info!("Local store cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CreateCompany, CreatePriceOverride, ListCompaniesFilter, UpdateCompany,
        UpdatePriceOverride,
    };

    fn company(name: &str) -> CreateCompany {
        serde_json::from_value(serde_json::json!({ "name": name })).unwrap()
    }

    #[tokio::test]
    async fn test_create_then_list_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();

        store.companies().create(company("Zenith Labs")).await.unwrap();
        store.companies().create(company("Acme Corp")).await.unwrap();

        let rows = store
            .companies()
            .list(&ListCompaniesFilter::default())
            .await
            .unwrap();
        let names: Vec<_> = rows.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Acme Corp", "Zenith Labs"]);
    }

    #[tokio::test]
    async fn test_rows_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let created = {
            let store = LocalStore::new(dir.path()).await.unwrap();
            store.companies().create(company("Acme Corp")).await.unwrap()
        };

        let reopened = LocalStore::new(dir.path()).await.unwrap();
        let found = reopened.companies().get(created.id).await.unwrap();
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn test_corrupt_document_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();
        fs::write(dir.path().join("companies.json"), b"{not json")
            .await
            .unwrap();

        let rows = store
            .companies()
            .list(&ListCompaniesFilter::default())
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_missing_ids_have_no_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();
        let kept = store.companies().create(company("Acme Corp")).await.unwrap();

        let missing = Uuid::new_v4();
        assert!(!store.companies().delete(missing).await.unwrap());
        assert!(store
            .companies()
            .update(missing, UpdateCompany::default())
            .await
            .unwrap()
            .is_none());

        let rows = store
            .companies()
            .list(&ListCompaniesFilter::default())
            .await
            .unwrap();
        assert_eq!(rows, vec![kept]);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();
        let created = store.companies().create(company("Acme Corp")).await.unwrap();

        let patch = UpdateCompany {
            is_active: Some(false),
            ..Default::default()
        };
        let updated = store
            .companies()
            .update(created.id, patch)
            .await
            .unwrap()
            .unwrap();
        assert!(!updated.is_active);
        assert!(updated.updated_at >= created.updated_at);

        let active = store
            .companies()
            .list(&ListCompaniesFilter { active_only: true })
            .await
            .unwrap();
        assert!(active.is_empty());

        assert!(store.companies().delete(created.id).await.unwrap());
        assert!(store.companies().get(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_creates_are_all_kept() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(LocalStore::new(dir.path()).await.unwrap());

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .companies()
                        .create(company(&format!("Company {}", i)))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let rows = store
            .companies()
            .list(&ListCompaniesFilter::default())
            .await
            .unwrap();
        assert_eq!(rows.len(), 10);
    }

    #[tokio::test]
    async fn test_rejected_update_leaves_row_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();
        let rule: CreatePriceOverride = serde_json::from_value(serde_json::json!({
            "food_item_id": Uuid::new_v4(),
            "company_id": Uuid::new_v4(),
            "price": "120"
        }))
        .unwrap();
        let rule = store.price_overrides().create(rule).await.unwrap();

        let unscope: UpdatePriceOverride =
            serde_json::from_value(serde_json::json!({ "company_id": null })).unwrap();
        let result = store.price_overrides().update(rule.id, unscope).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        let stored = store.price_overrides().get(rule.id).await.unwrap();
        assert_eq!(stored, Some(rule));
    }

    #[tokio::test]
    async fn test_failed_restore_keeps_every_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();
        let kept = store.companies().create(company("Acme Corp")).await.unwrap();

        // A directory where the staged document should go makes the last write fail.
        fs::create_dir(dir.path().join("price_overrides.json.staged"))
            .await
            .unwrap();
        let backup: Backup = serde_json::from_value(serde_json::json!({
            "companies": [],
            "priceOverrides": []
        }))
        .unwrap();

        assert!(store.restore(&backup).await.is_err());

        let rows = store
            .companies()
            .list(&ListCompaniesFilter::default())
            .await
            .unwrap();
        assert_eq!(rows, vec![kept]);
        assert!(!dir.path().join("companies.json.staged").exists());
    }

    #[tokio::test]
    async fn test_clear_empties_every_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();
        store.companies().create(company("Acme Corp")).await.unwrap();

        store.clear().await.unwrap();

        let rows = store
            .companies()
            .list(&ListCompaniesFilter::default())
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}
