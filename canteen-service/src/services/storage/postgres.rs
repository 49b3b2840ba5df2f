//! Remote storage backend for canteen-service (PostgreSQL).

use super::{Repository, Storage};
use crate::config::{DatabaseConfig, StorageBackend};
use crate::models::{
    Company, CompanyPayment, Employee, EmployeePayment, Entity, FoodItem, FoodTransaction,
    ListCompaniesFilter, ListCompanyPaymentsFilter, ListEmployeePaymentsFilter,
    ListEmployeesFilter, ListFoodItemsFilter, ListPriceOverridesFilter, ListTransactionsFilter,
    PriceOverride,
};
use crate::services::backup::Backup;
use crate::services::metrics::{record_storage_operation, STORAGE_OPERATION_DURATION};
use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{FromRow, PgConnection};
use std::marker::PhantomData;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const BACKEND: &str = "remote";

/// Row-level SQL for one entity table.
#[async_trait]
pub trait PgEntity: Entity + for<'r> FromRow<'r, PgRow> {
    const TABLE: &'static str;

    /// Filtered listing in the entity's listing order.
    async fn select(pool: &PgPool, filter: &Self::Filter) -> Result<Vec<Self>, sqlx::Error>;

    /// Insert the row and return it as stored.
    async fn insert(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error>;

    /// Persist every mutable column of an existing row and return it as stored.
    async fn write_back(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error>;
}

fn db_error(collection: &str, action: &str, e: sqlx::Error) -> AppError {
    AppError::DatabaseError(anyhow::anyhow!(
        "Failed to {} {}: {}",
        action,
        collection,
        e
    ))
}

/// Repository over a single table.
pub struct PgTable<E> {
    pool: PgPool,
    _entity: PhantomData<fn() -> E>,
}

impl<E: PgEntity> PgTable<E> {
    fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    fn timer(&self, operation: &str) -> prometheus::HistogramTimer {
        STORAGE_OPERATION_DURATION
            .with_label_values(&[BACKEND, E::COLLECTION, operation])
            .start_timer()
    }
}

#[async_trait]
impl<E: PgEntity> Repository<E> for PgTable<E> {
    #[instrument(skip(self, filter), fields(table = E::TABLE))]
    async fn list(&self, filter: &E::Filter) -> Result<Vec<E>, AppError> {
        let timer = self.timer("list");

        let rows = E::select(&self.pool, filter)
            .await
            .map_err(|e| db_error(E::COLLECTION, "list", e))?;

        timer.observe_duration();
        record_storage_operation(BACKEND, E::COLLECTION, "list");
        Ok(rows)
    }

    #[instrument(skip(self), fields(table = E::TABLE))]
    async fn get(&self, id: Uuid) -> Result<Option<E>, AppError> {
        let timer = self.timer("get");

        let sql = format!("SELECT * FROM {} WHERE id = $1", E::TABLE);
        let row = sqlx::query_as::<_, E>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error(E::COLLECTION, "get", e))?;

        timer.observe_duration();
        Ok(row)
    }

    #[instrument(skip(self, input), fields(table = E::TABLE))]
    async fn create(&self, input: E::Create) -> Result<E, AppError> {
        let timer = self.timer("create");

        let row = E::from_create(input, Uuid::new_v4(), Utc::now())?;
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| db_error(E::COLLECTION, "acquire connection for", e))?;
        let row = row
            .insert(&mut *conn)
            .await
            .map_err(|e| db_error(E::COLLECTION, "insert into", e))?;

        timer.observe_duration();
        record_storage_operation(BACKEND, E::COLLECTION, "create");
        info!(table = E::TABLE, id = %row.id(), "Record created");
        Ok(row)
    }

    #[instrument(skip(self, update), fields(table = E::TABLE))]
    async fn update(&self, id: Uuid, update: E::Update) -> Result<Option<E>, AppError> {
        let timer = self.timer("update");

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let sql = format!("SELECT * FROM {} WHERE id = $1 FOR UPDATE", E::TABLE);
        let existing = sqlx::query_as::<_, E>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| db_error(E::COLLECTION, "lock", e))?;

        let Some(mut row) = existing else {
            tx.rollback().await.ok();
            return Ok(None);
        };

        row.apply_update(update, Utc::now())?;
        let row = row
            .write_back(&mut *tx)
            .await
            .map_err(|e| db_error(E::COLLECTION, "update", e))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        record_storage_operation(BACKEND, E::COLLECTION, "update");
        info!(table = E::TABLE, id = %id, "Record updated");
        Ok(Some(row))
    }

    #[instrument(skip(self), fields(table = E::TABLE))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let timer = self.timer("delete");

        let sql = format!("DELETE FROM {} WHERE id = $1", E::TABLE);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(E::COLLECTION, "delete from", e))?;

        timer.observe_duration();
        let deleted = result.rows_affected() > 0;
        if deleted {
            record_storage_operation(BACKEND, E::COLLECTION, "delete");
            info!(table = E::TABLE, id = %id, "Record deleted");
        }
        Ok(deleted)
    }
}

/// Database connection pool plus one repository per table.
pub struct Database {
    pool: PgPool,
    companies: PgTable<Company>,
    employees: PgTable<Employee>,
    food_items: PgTable<FoodItem>,
    transactions: PgTable<FoodTransaction>,
    company_payments: PgTable<CompanyPayment>,
    employee_payments: PgTable<EmployeePayment>,
    price_overrides: PgTable<PriceOverride>,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(config), fields(service = "canteen-service"))]
    pub async fn new(config: &DatabaseConfig) -> Result<Self, AppError> {
        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(config.url())
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            companies: PgTable::new(pool.clone()),
            employees: PgTable::new(pool.clone()),
            food_items: PgTable::new(pool.clone()),
            transactions: PgTable::new(pool.clone()),
            company_payments: PgTable::new(pool.clone()),
            employee_payments: PgTable::new(pool.clone()),
            price_overrides: PgTable::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

async fn replace_table<E: PgEntity>(
    conn: &mut PgConnection,
    rows: Option<&Vec<E>>,
) -> Result<(), AppError> {
    let Some(rows) = rows else {
        return Ok(());
    };

    let sql = format!("DELETE FROM {}", E::TABLE);
    sqlx::query(&sql)
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error(E::COLLECTION, "clear", e))?;

    for row in rows {
        row.insert(&mut *conn)
            .await
            .map_err(|e| db_error(E::COLLECTION, "restore", e))?;
    }

    info!(table = E::TABLE, count = rows.len(), "Table restored");
    Ok(())
}

#[async_trait]
impl Storage for Database {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Remote
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

    /// Check database health.
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        let timer = STORAGE_OPERATION_DURATION
            .with_label_values(&[BACKEND, "database", "health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    #[instrument(skip(self, backup))]
    async fn restore(&self, backup: &Backup) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        replace_table(&mut *tx, backup.companies.as_ref()).await?;
        replace_table(&mut *tx, backup.employees.as_ref()).await?;
        replace_table(&mut *tx, backup.food_items.as_ref()).await?;
        replace_table(&mut *tx, backup.transactions.as_ref()).await?;
        replace_table(&mut *tx, backup.company_payments.as_ref()).await?;
        replace_table(&mut *tx, backup.employee_payments.as_ref()).await?;
        replace_table(&mut *tx, backup.price_overrides.as_ref()).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit restore: {}", e))
        })?;

        info!("Database restored from backup");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<(), AppError> {
        sqlx::query(
            r#"
            TRUNCATE companies, employees, food_items, food_transactions,
                     company_payments, employee_payments, price_overrides
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to clear database: {}", e)))?;

        info!("Database cleared");
        Ok(())
    }
}

// =========================================================================
// Table mappings
// =========================================================================

#[async_trait]
impl PgEntity for Company {
    const TABLE: &'static str = "companies";

    async fn select(pool: &PgPool, filter: &ListCompaniesFilter) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Company>(
            r#"
            SELECT id, name, code, address, contact_person, phone, email, is_active, created_at, updated_at
            FROM companies
            WHERE (NOT $1 OR is_active)
            ORDER BY LOWER(name), name, id
            "#,
        )
        .bind(filter.active_only)
        .fetch_all(pool)
        .await
    }

    async fn insert(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO companies (id, name, code, address, contact_person, phone, email, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.code)
        .bind(&self.address)
        .bind(&self.contact_person)
        .bind(&self.phone)
        .bind(&self.email)
        .bind(self.is_active)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(conn)
        .await
    }

    async fn write_back(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE companies
            SET name = $2, code = $3, address = $4, contact_person = $5, phone = $6,
                email = $7, is_active = $8, updated_at = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.code)
        .bind(&self.address)
        .bind(&self.contact_person)
        .bind(&self.phone)
        .bind(&self.email)
        .bind(self.is_active)
        .bind(self.updated_at)
        .fetch_one(conn)
        .await
    }
}

#[async_trait]
impl PgEntity for Employee {
    const TABLE: &'static str = "employees";

    async fn select(pool: &PgPool, filter: &ListEmployeesFilter) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, company_id, name, employee_code, phone, image_url, default_meal_price,
                   status, notes, created_at, updated_at
            FROM employees
            WHERE ($1::uuid IS NULL OR company_id = $1)
              AND ($2::varchar IS NULL OR status = $2)
            ORDER BY LOWER(name), name, id
            "#,
        )
        .bind(filter.company_id)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(pool)
        .await
    }

    async fn insert(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO employees (id, company_id, name, employee_code, phone, image_url,
                                   default_meal_price, status, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.company_id)
        .bind(&self.name)
        .bind(&self.employee_code)
        .bind(&self.phone)
        .bind(&self.image_url)
        .bind(self.default_meal_price)
        .bind(self.status.as_str())
        .bind(&self.notes)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(conn)
        .await
    }

    async fn write_back(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE employees
            SET company_id = $2, name = $3, employee_code = $4, phone = $5, image_url = $6,
                default_meal_price = $7, status = $8, notes = $9, updated_at = $10
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.company_id)
        .bind(&self.name)
        .bind(&self.employee_code)
        .bind(&self.phone)
        .bind(&self.image_url)
        .bind(self.default_meal_price)
        .bind(self.status.as_str())
        .bind(&self.notes)
        .bind(self.updated_at)
        .fetch_one(conn)
        .await
    }
}

#[async_trait]
impl PgEntity for FoodItem {
    const TABLE: &'static str = "food_items";

    async fn select(pool: &PgPool, filter: &ListFoodItemsFilter) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, FoodItem>(
            r#"
            SELECT id, name, category, default_price, is_active, created_at, updated_at
            FROM food_items
            WHERE (NOT $1 OR is_active)
              AND ($2::varchar IS NULL OR category = $2)
            ORDER BY LOWER(name), name, id
            "#,
        )
        .bind(filter.active_only)
        .bind(filter.category.as_deref())
        .fetch_all(pool)
        .await
    }

    async fn insert(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO food_items (id, name, category, default_price, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.category)
        .bind(self.default_price)
        .bind(self.is_active)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(conn)
        .await
    }

    async fn write_back(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE food_items
            SET name = $2, category = $3, default_price = $4, is_active = $5, updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.category)
        .bind(self.default_price)
        .bind(self.is_active)
        .bind(self.updated_at)
        .fetch_one(conn)
        .await
    }
}

#[async_trait]
impl PgEntity for FoodTransaction {
    const TABLE: &'static str = "food_transactions";

    async fn select(
        pool: &PgPool,
        filter: &ListTransactionsFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, FoodTransaction>(
            r#"
            SELECT id, date, company_id, employee_id, food_item_id, quantity, unit_price,
                   total_amount, notes, created_at, updated_at
            FROM food_transactions
            WHERE ($1::uuid IS NULL OR employee_id = $1)
              AND ($2::uuid IS NULL OR company_id = $2)
              AND ($3::uuid IS NULL OR food_item_id = $3)
              AND ($4::date IS NULL OR date >= $4)
              AND ($5::date IS NULL OR date <= $5)
            ORDER BY date DESC, created_at DESC, id
            "#,
        )
        .bind(filter.employee_id)
        .bind(filter.company_id)
        .bind(filter.food_item_id)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(pool)
        .await
    }

    async fn insert(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO food_transactions (id, date, company_id, employee_id, food_item_id, quantity,
                                           unit_price, total_amount, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.date)
        .bind(self.company_id)
        .bind(self.employee_id)
        .bind(self.food_item_id)
        .bind(self.quantity)
        .bind(self.unit_price)
        .bind(self.total_amount)
        .bind(&self.notes)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(conn)
        .await
    }

    async fn write_back(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE food_transactions
            SET date = $2, quantity = $3, unit_price = $4, total_amount = $5, notes = $6,
                updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.date)
        .bind(self.quantity)
        .bind(self.unit_price)
        .bind(self.total_amount)
        .bind(&self.notes)
        .bind(self.updated_at)
        .fetch_one(conn)
        .await
    }
}

#[async_trait]
impl PgEntity for CompanyPayment {
    const TABLE: &'static str = "company_payments";

    async fn select(
        pool: &PgPool,
        filter: &ListCompanyPaymentsFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CompanyPayment>(
            r#"
            SELECT id, company_id, payment_date, amount, method, reference, notes, created_at, updated_at
            FROM company_payments
            WHERE ($1::uuid IS NULL OR company_id = $1)
              AND ($2::date IS NULL OR payment_date >= $2)
              AND ($3::date IS NULL OR payment_date <= $3)
            ORDER BY payment_date DESC, created_at DESC, id
            "#,
        )
        .bind(filter.company_id)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(pool)
        .await
    }

    async fn insert(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO company_payments (id, company_id, payment_date, amount, method, reference,
                                          notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.company_id)
        .bind(self.payment_date)
        .bind(self.amount)
        .bind(self.method.map(|m| m.as_str()))
        .bind(&self.reference)
        .bind(&self.notes)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(conn)
        .await
    }

    async fn write_back(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE company_payments
            SET payment_date = $2, amount = $3, method = $4, reference = $5, notes = $6,
                updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.payment_date)
        .bind(self.amount)
        .bind(self.method.map(|m| m.as_str()))
        .bind(&self.reference)
        .bind(&self.notes)
        .bind(self.updated_at)
        .fetch_one(conn)
        .await
    }
}

#[async_trait]
impl PgEntity for EmployeePayment {
    const TABLE: &'static str = "employee_payments";

    async fn select(
        pool: &PgPool,
        filter: &ListEmployeePaymentsFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, EmployeePayment>(
            r#"
            SELECT id, employee_id, company_id, payment_date, amount, method, reference, notes,
                   created_at, updated_at
            FROM employee_payments
            WHERE ($1::uuid IS NULL OR employee_id = $1)
              AND ($2::uuid IS NULL OR company_id = $2)
              AND ($3::date IS NULL OR payment_date >= $3)
              AND ($4::date IS NULL OR payment_date <= $4)
            ORDER BY payment_date DESC, created_at DESC, id
            "#,
        )
        .bind(filter.employee_id)
        .bind(filter.company_id)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(pool)
        .await
    }

    async fn insert(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO employee_payments (id, employee_id, company_id, payment_date, amount, method,
                                           reference, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.employee_id)
        .bind(self.company_id)
        .bind(self.payment_date)
        .bind(self.amount)
        .bind(self.method.map(|m| m.as_str()))
        .bind(&self.reference)
        .bind(&self.notes)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(conn)
        .await
    }

    async fn write_back(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE employee_payments
            SET payment_date = $2, amount = $3, method = $4, reference = $5, notes = $6,
                updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.payment_date)
        .bind(self.amount)
        .bind(self.method.map(|m| m.as_str()))
        .bind(&self.reference)
        .bind(&self.notes)
        .bind(self.updated_at)
        .fetch_one(conn)
        .await
    }
}

#[async_trait]
impl PgEntity for PriceOverride {
    const TABLE: &'static str = "price_overrides";

    async fn select(
        pool: &PgPool,
        filter: &ListPriceOverridesFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, PriceOverride>(
            r#"
            SELECT id, food_item_id, company_id, employee_id, price, priority, created_at, updated_at
            FROM price_overrides
            WHERE ($1::uuid IS NULL OR food_item_id = $1)
              AND ($2::uuid IS NULL OR company_id = $2)
              AND ($3::uuid IS NULL OR employee_id = $3)
            ORDER BY priority DESC, updated_at DESC, id
            "#,
        )
        .bind(filter.food_item_id)
        .bind(filter.company_id)
        .bind(filter.employee_id)
        .fetch_all(pool)
        .await
    }

    async fn insert(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO price_overrides (id, food_item_id, company_id, employee_id, price, priority,
                                         created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.food_item_id)
        .bind(self.company_id)
        .bind(self.employee_id)
        .bind(self.price)
        .bind(self.priority)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(conn)
        .await
    }

    async fn write_back(&self, conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE price_overrides
            SET company_id = $2, employee_id = $3, price = $4, priority = $5, updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.company_id)
        .bind(self.employee_id)
        .bind(self.price)
        .bind(self.priority)
        .bind(self.updated_at)
        .fetch_one(conn)
        .await
    }
}
