//! Configuration for canteen-service.

use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::config::{self as core_config, get_env, get_env_parsed, is_production};
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct CanteenConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub storage: StorageConfig,
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Backend used when no saved preference exists.
    pub default_backend: StorageBackend,
    /// Directory holding the local collections and the saved mode preference.
    pub local_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl DatabaseConfig {
    pub fn url(&self) -> &str {
        self.url.expose_secret()
    }
}

/// Which persistence backend serves data operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// PostgreSQL.
    Remote,
    /// JSON documents on local disk.
    Local,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Remote => "remote",
            StorageBackend::Local => "local",
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "remote" | "cloud" | "postgres" => Ok(StorageBackend::Remote),
            "local" => Ok(StorageBackend::Local),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

impl CanteenConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common = core_config::Config::load()?;
        let is_prod = is_production();

        let default_backend = get_env("STORAGE_BACKEND", Some("local"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        // The remote backend is optional: without a URL only local mode is offered.
        let database = match env::var("DATABASE_URL") {
            Ok(url) if !url.is_empty() => Some(DatabaseConfig {
                url: Secret::new(url),
                max_connections: get_env_parsed("DATABASE_MAX_CONNECTIONS", 5)?,
                min_connections: get_env_parsed("DATABASE_MIN_CONNECTIONS", 1)?,
            }),
            _ => None,
        };

        Ok(CanteenConfig {
            common,
            service_name: get_env("SERVICE_NAME", Some("canteen-service"), false)?,
            log_level: get_env("LOG_LEVEL", Some("info"), false)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            storage: StorageConfig {
                default_backend,
                local_path: PathBuf::from(get_env("STORAGE_LOCAL_PATH", Some("data"), is_prod)?),
            },
            database,
        })
    }

    /// Configuration for a local-only instance rooted at `local_path`.
    pub fn local(local_path: impl Into<PathBuf>) -> Self {
        CanteenConfig {
            common: core_config::Config::default(),
            service_name: "canteen-service".to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            storage: StorageConfig {
                default_backend: StorageBackend::Local,
                local_path: local_path.into(),
            },
            database: None,
        }
    }
}
