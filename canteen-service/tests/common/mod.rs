//! Test helper module for canteen-service integration tests.
//!
//! Every app gets its own temporary data directory. The PostgreSQL variant
//! additionally isolates itself in a fresh schema.

#![allow(dead_code)]

use canteen_service::config::{CanteenConfig, DatabaseConfig, StorageBackend};
use canteen_service::startup::Application;
use reqwest::{Client, Response, StatusCode};
use rust_decimal::Decimal;
use secrecy::Secret;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Once;
use tempfile::TempDir;

static INIT: Once = Once::new();

// Counter for unique schema names
static SCHEMA_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("warn,canteen_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Parse a decimal the service rendered as a JSON string.
pub fn dec(value: &Value) -> Decimal {
    let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Decimal::from_str(&raw).unwrap_or_else(|_| panic!("not a decimal: {}", value))
}

/// Test application wrapper for integration tests.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: Client,
    pub data_dir: TempDir,
    schema: Option<(String, String)>,
}

impl TestApp {
    /// Spawn a local-only app on a random port.
    pub async fn spawn() -> Self {
        let data_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = CanteenConfig::local(data_dir.path());
        Self::launch(config, data_dir, None).await
    }

    /// Spawn an app over an existing data directory, as after a restart.
    pub async fn respawn(data_dir: TempDir) -> Self {
        let config = CanteenConfig::local(data_dir.path());
        Self::launch(config, data_dir, None).await
    }

    /// Spawn an app backed by PostgreSQL, or `None` when `TEST_DATABASE_URL`
    /// is not set.
    pub async fn spawn_with_database() -> Option<Self> {
        let base_url = std::env::var("TEST_DATABASE_URL").ok()?;
        let counter = SCHEMA_COUNTER.fetch_add(1, Ordering::SeqCst);
        let schema_name = format!("test_canteen_{}_{}", std::process::id(), counter);

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(2)
            .connect(&base_url)
            .await
            .expect("Failed to connect to test database");
        sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema_name))
            .execute(&pool)
            .await
            .ok();
        sqlx::query(&format!("CREATE SCHEMA {}", schema_name))
            .execute(&pool)
            .await
            .expect("Failed to create test schema");
        pool.close().await;

        let separator = if base_url.contains('?') { "&" } else { "?" };
        let db_url_with_schema = format!(
            "{}{}options=-c search_path%3D{}",
            base_url, separator, schema_name
        );

        let data_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut config = CanteenConfig::local(data_dir.path());
        config.storage.default_backend = StorageBackend::Remote;
        config.database = Some(DatabaseConfig {
            url: Secret::new(db_url_with_schema),
            max_connections: 5,
            min_connections: 1,
        });

        Some(Self::launch(config, data_dir, Some((base_url, schema_name))).await)
    }

    async fn launch(
        mut config: CanteenConfig,
        data_dir: TempDir,
        schema: Option<(String, String)>,
    ) -> Self {
        init_tracing();
        config.common.port = 0;

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.http_port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server by polling the health endpoint
        let client = Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
            data_dir,
            schema,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Response {
        self.client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put(&self, path: &str, body: &Value) -> Response {
        self.client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// GET and decode a JSON body, asserting 200.
    pub async fn get_json(&self, path: &str) -> Value {
        let response = self.get(path).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {}", path);
        response.json().await.expect("Failed to parse JSON")
    }

    /// POST and decode a JSON body, asserting 201.
    pub async fn create(&self, path: &str, body: Value) -> Value {
        let response = self.post(path, &body).await;
        assert_eq!(response.status(), StatusCode::CREATED, "POST {}", path);
        response.json().await.expect("Failed to parse JSON")
    }

    pub async fn create_company(&self, name: &str) -> String {
        let company = self.create("/companies", json!({ "name": name })).await;
        company["id"].as_str().expect("company id").to_string()
    }

    pub async fn create_employee(&self, company_id: &str, name: &str) -> String {
        let employee = self
            .create(
                "/employees",
                json!({ "company_id": company_id, "name": name }),
            )
            .await;
        employee["id"].as_str().expect("employee id").to_string()
    }

    pub async fn create_food_item(&self, name: &str, default_price: &str) -> String {
        let item = self
            .create(
                "/food-items",
                json!({ "name": name, "default_price": default_price }),
            )
            .await;
        item["id"].as_str().expect("food item id").to_string()
    }

    /// Record one meal line and return the created transaction.
    pub async fn record_meal(
        &self,
        date: &str,
        employee_id: &str,
        food_item_id: &str,
        quantity: i32,
    ) -> Value {
        let recorded = self
            .create(
                "/transactions",
                json!({
                    "date": date,
                    "entries": [{
                        "employee_id": employee_id,
                        "food_item_id": food_item_id,
                        "quantity": quantity
                    }]
                }),
            )
            .await;
        recorded[0].clone()
    }

    /// Drop the PostgreSQL schema, if any.
    pub async fn cleanup(&self) {
        let Some((base_url, schema_name)) = &self.schema else {
            return;
        };
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect(base_url)
            .await
            .ok();

        if let Some(pool) = pool {
            let _ = sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema_name))
                .execute(&pool)
                .await;
            pool.close().await;
        }
    }
}
