//! Shared database managers, one per file, closed together on shutdown.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::error::Result;
use crate::manager::DatabaseManager;
use crate::schema::DbDeclarer;

#[derive(Default)]
pub struct DatabaseRegistry {
    managers: Mutex<HashMap<PathBuf, Arc<DatabaseManager>>>,
}

impl DatabaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The manager for `path`, opened on first use.
    pub async fn open(&self, path: impl AsRef<Path>) -> Result<Arc<DatabaseManager>> {
        let path = path.as_ref().to_path_buf();
        let mut managers = self.managers.lock().await;
        if let Some(manager) = managers.get(&path) {
            return Ok(manager.clone());
        }
        let manager = Arc::new(DatabaseManager::open(&path).await?);
        managers.insert(path, manager.clone());
        Ok(manager)
    }

    /// Creates or validates the declared schema, then opens its manager.
    pub async fn open_declared(&self, declarer: &DbDeclarer) -> Result<Arc<DatabaseManager>> {
        declarer.create_or_validate().await?;
        self.open(&declarer.path).await
    }

    pub async fn len(&self) -> usize {
        self.managers.lock().await.len()
    }

    /// Closes every open database.
    pub async fn shutdown(&self) {
        let managers: Vec<_> = self.managers.lock().await.drain().collect();
        for (path, manager) in managers {
            manager.close().await;
            info!(path = %path.display(), "database closed");
        }
    }
}
