//! Module discovery: modules register a factory under their top name.

use std::sync::Arc;

use crate::module::{BotModule, ModuleEnv};

/// Builds a module instance. May fail; see `IGNORE_MODULE_INIT_ERROR`.
pub type ModuleFactory =
    Arc<dyn Fn(&ModuleEnv) -> anyhow::Result<Arc<dyn BotModule>> + Send + Sync>;

/// Prefix of the store name of framework-internal modules.
pub const INTERNAL_PREFIX: &str = "internal.";

#[derive(Clone)]
pub struct ModuleDescriptor {
    pub name: String,
    pub internal: bool,
    pub factory: ModuleFactory,
}

impl ModuleDescriptor {
    /// Name the module is stored under: `internal.{name}` for internal modules.
    pub fn store_name(&self) -> String {
        if self.internal {
            format!("{}{}", INTERNAL_PREFIX, self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Every module the binary knows about, in registration order.
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    descriptors: Vec<ModuleDescriptor>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user module.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&ModuleEnv) -> anyhow::Result<Arc<dyn BotModule>> + Send + Sync + 'static,
    {
        self.push(name.into(), false, Arc::new(factory))
    }

    /// Registers a framework-internal module (stored as `internal.{name}`).
    pub fn register_internal<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&ModuleEnv) -> anyhow::Result<Arc<dyn BotModule>> + Send + Sync + 'static,
    {
        self.push(name.into(), true, Arc::new(factory))
    }

    fn push(&mut self, name: String, internal: bool, factory: ModuleFactory) -> &mut Self {
        self.descriptors.push(ModuleDescriptor {
            name,
            internal,
            factory,
        });
        self
    }

    pub fn internal(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.descriptors.iter().filter(|d| d.internal)
    }

    pub fn user(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.descriptors.iter().filter(|d| !d.internal)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
