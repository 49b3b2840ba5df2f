//! Process-wide storage mode toggle.

use crate::config::StorageBackend;
use crate::services::storage::{Database, LocalStore, Storage};
use serde::Serialize;
use service_core::error::AppError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{info, warn};

const PREFERENCE_FILE: &str = "storage_mode";

/// Current mode as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StorageModeStatus {
    pub mode: StorageBackend,
    pub remote_available: bool,
}

/// Holds both backends and the mode selecting between them.
///
/// The remote backend exists only when a database is configured. Every data
/// operation calls [`StorageSwitch::active`] once at its start.
pub struct StorageSwitch {
    local: Arc<LocalStore>,
    remote: Option<Arc<Database>>,
    mode: RwLock<StorageBackend>,
    preference_path: PathBuf,
}

impl StorageSwitch {
    /// Pick the start-up mode: the saved preference if usable, then
    /// `default_backend` if usable, then local.
    pub async fn new(
        local: LocalStore,
        remote: Option<Database>,
        default_backend: StorageBackend,
    ) -> Self {
        let preference_path = local.dir().join(PREFERENCE_FILE);
        let remote_available = remote.is_some();
        let usable = |mode: StorageBackend| mode == StorageBackend::Local || remote_available;

        let saved = read_preference(&preference_path).await;
        let mode = match saved {
            Some(mode) if usable(mode) => mode,
            _ if usable(default_backend) => default_backend,
            _ => StorageBackend::Local,
        };

        info!(mode = %mode, remote_available, "Storage mode selected");

        Self {
            local: Arc::new(local),
            remote: remote.map(Arc::new),
            mode: RwLock::new(mode),
            preference_path,
        }
    }

    pub fn remote_available(&self) -> bool {
        self.remote.is_some()
    }

    pub async fn mode(&self) -> StorageBackend {
        *self.mode.read().await
    }

    pub async fn status(&self) -> StorageModeStatus {
        StorageModeStatus {
            mode: self.mode().await,
            remote_available: self.remote_available(),
        }
    }

    /// The backend serving the current operation.
    pub async fn active(&self) -> Arc<dyn Storage> {
        let mode = *self.mode.read().await;
        match (mode, &self.remote) {
            (StorageBackend::Remote, Some(remote)) => remote.clone(),
            _ => self.local.clone(),
        }
    }

    /// Switch backends and persist the choice.
    pub async fn set_mode(&self, mode: StorageBackend) -> Result<StorageModeStatus, AppError> {
        if mode == StorageBackend::Remote && self.remote.is_none() {
            return Err(AppError::ServiceUnavailable(
                "Remote storage is not configured".to_string(),
            ));
        }

        let mut current = self.mode.write().await;
        fs::write(&self.preference_path, mode.as_str()).await?;
        let previous = std::mem::replace(&mut *current, mode);

        info!(from = %previous, to = %mode, "Storage mode changed");
        Ok(StorageModeStatus {
            mode,
            remote_available: self.remote_available(),
        })
    }
}

async fn read_preference(path: &Path) -> Option<StorageBackend> {
    let raw = fs::read_to_string(path).await.ok()?;
    match raw.parse() {
        Ok(mode) => Some(mode),
        Err(e) => {
            warn!(error = %e, "Ignoring invalid storage mode preference");
            None
        }
    }
}
