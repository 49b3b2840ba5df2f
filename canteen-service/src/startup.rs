//! Application startup and lifecycle management.

use crate::config::CanteenConfig;
use crate::handlers::{
    backup, companies, employees, food_items, health, payments, price_overrides, reports,
    settings, transactions,
};
use crate::services::{init_metrics, Database, LocalStore, StorageSwitch};
use axum::{
    middleware,
    routing::{delete, get},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::request_id_middleware;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: CanteenConfig,
    pub storage: Arc<StorageSwitch>,
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    http_listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: CanteenConfig) -> Result<Self, AppError> {
        init_metrics();

        let local = LocalStore::new(config.storage.local_path.clone()).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to open local store");
            e
        })?;

        // Remote storage is optional; without a database only local mode is offered.
        let remote = match &config.database {
            Some(db_config) => {
                let db = Database::new(db_config).await.map_err(|e| {
                    tracing::error!(error = %e, "Failed to connect to PostgreSQL");
                    e
                })?;
                db.run_migrations().await.map_err(|e| {
                    tracing::error!(error = %e, "Failed to run migrations");
                    e
                })?;
                Some(db)
            }
            None => {
                tracing::info!("DATABASE_URL not set, remote storage disabled");
                None
            }
        };

        let storage =
            Arc::new(StorageSwitch::new(local, remote, config.storage.default_backend).await);

        let http_addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let http_listener = TcpListener::bind(http_addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %http_addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        tracing::info!(http_port = http_port, "Canteen service listener bound");

        Ok(Self {
            http_port,
            http_listener,
            state: AppState { config, storage },
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = router(self.state);

        tracing::info!(
            service = "canteen-service",
            version = env!("CARGO_PKG_VERSION"),
            http_port = self.http_port,
            "Service ready to accept connections"
        );

        axum::serve(self.http_listener, router).await.map_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}

/// Build the HTTP router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/companies",
            get(companies::list_companies).post(companies::create_company),
        )
        .route(
            "/companies/:id",
            get(companies::get_company)
                .patch(companies::update_company)
                .delete(companies::delete_company),
        )
        .route("/companies/:id/balance", get(companies::company_balance))
        .route("/companies/:id/employees", get(companies::company_employees))
        .route("/companies/:id/statement", get(companies::company_statement))
        .route(
            "/employees",
            get(employees::list_employees).post(employees::create_employee),
        )
        .route(
            "/employees/:id",
            get(employees::get_employee)
                .patch(employees::update_employee)
                .delete(employees::delete_employee),
        )
        .route("/employees/summary", get(employees::employee_summaries))
        .route("/employees/:id/balance", get(employees::employee_balance))
        .route(
            "/food-items",
            get(food_items::list_food_items).post(food_items::create_food_item),
        )
        .route(
            "/food-items/:id",
            get(food_items::get_food_item)
                .patch(food_items::update_food_item)
                .delete(food_items::delete_food_item),
        )
        .route(
            "/transactions",
            get(transactions::list_transactions).post(transactions::record_meals),
        )
        .route(
            "/transactions/:id",
            get(transactions::get_transaction)
                .patch(transactions::update_transaction)
                .delete(transactions::delete_transaction),
        )
        .route(
            "/company-payments",
            get(payments::list_company_payments).post(payments::create_company_payment),
        )
        .route(
            "/company-payments/:id",
            get(payments::get_company_payment)
                .patch(payments::update_company_payment)
                .delete(payments::delete_company_payment),
        )
        .route(
            "/employee-payments",
            get(payments::list_employee_payments).post(payments::create_employee_payment),
        )
        .route(
            "/employee-payments/:id",
            get(payments::get_employee_payment)
                .patch(payments::update_employee_payment)
                .delete(payments::delete_employee_payment),
        )
        .route(
            "/price-overrides",
            get(price_overrides::list_price_overrides)
                .post(price_overrides::create_price_override),
        )
        .route(
            "/price-overrides/:id",
            get(price_overrides::get_price_override)
                .patch(price_overrides::update_price_override)
                .delete(price_overrides::delete_price_override),
        )
        .route("/pricing/resolve", get(price_overrides::resolve_price))
        .route("/dashboard", get(reports::dashboard))
        .route("/reports/outstanding", get(reports::outstanding))
        .route("/backup/export", get(backup::export_backup))
        .route("/backup/import", axum::routing::post(backup::import_backup))
        .route("/backup", delete(backup::clear_data))
        .route(
            "/settings/storage-mode",
            get(settings::get_storage_mode).put(settings::set_storage_mode),
        )
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics_handler))
        .route_layer(middleware::from_fn(metrics_middleware));

    api.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
