//! Feature modules: the [`BotModule`] trait and what a module factory receives.

use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use modbot_callback::SharedCallbackStore;
use modbot_chain::HandlerEntry;
use modbot_core::LangRegistry;
use modbot_storage::DatabaseRegistry;

use crate::config::BotConfig;
use crate::handle::FrameworkHandle;
use crate::helpers::ModuleHelpers;

pub const DEFAULT_PRIORITY: i32 = 128;
/// Valid priorities are `MIN_PRIORITY..MAX_PRIORITY`.
pub const MIN_PRIORITY: i32 = 0;
pub const MAX_PRIORITY: i32 = 256;

/// A feature module. Modules are loaded in ascending priority, ties broken by name; their
/// handlers join the chain in that order.
#[async_trait]
pub trait BotModule: Send + Sync + 'static {
    /// Load order; lower loads first. Must be in `[0, 256)`.
    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    /// Handlers this module contributes. Called once at init.
    fn handlers(self: Arc<Self>) -> Vec<HandlerEntry> {
        Vec::new()
    }

    /// Runs once the bot is connected, concurrently with the other modules.
    async fn post_init(&self, _fw: &FrameworkHandle) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs at local midnight.
    async fn daily_job(&self, _fw: &FrameworkHandle) -> anyhow::Result<()> {
        Ok(())
    }

    /// `self`, for lookup by concrete type.
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// What a module factory gets to build its module with.
#[derive(Clone)]
pub struct ModuleEnv {
    pub config: Arc<BotConfig>,
    pub data_dir: PathBuf,
    pub databases: Arc<DatabaseRegistry>,
    pub callbacks: SharedCallbackStore,
    pub lang: Arc<LangRegistry>,
}

impl ModuleEnv {
    pub fn new(
        config: Arc<BotConfig>,
        databases: Arc<DatabaseRegistry>,
        callbacks: SharedCallbackStore,
        lang: Arc<LangRegistry>,
    ) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            config,
            databases,
            callbacks,
            lang,
        }
    }

    /// Path of a module database file under the data dir.
    pub fn db_path(&self, file_name: &str) -> PathBuf {
        self.data_dir.join(file_name)
    }

    pub fn helpers(&self) -> ModuleHelpers {
        ModuleHelpers::new(self.callbacks.clone())
    }
}
