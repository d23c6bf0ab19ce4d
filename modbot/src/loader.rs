//! Instantiates registered modules and keeps them in load order.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::module::{BotModule, ModuleEnv, MAX_PRIORITY, MIN_PRIORITY};
use crate::registry::{ModuleDescriptor, ModuleRegistry};

/// A module instance plus what it was registered as.
#[derive(Clone)]
pub struct LoadedModule {
    pub name: String,
    /// `name`, or `internal.{name}` for internal modules.
    pub store_name: String,
    pub internal: bool,
    pub priority: i32,
    pub module: Arc<dyn BotModule>,
}

impl LoadedModule {
    fn downcast<T: BotModule>(&self) -> Option<Arc<T>> {
        self.module.clone().as_any().downcast::<T>().ok()
    }
}

/// Loaded modules: the enabled ones in load order, plus those disabled at runtime.
#[derive(Default)]
pub struct ModuleLoader {
    modules: Vec<LoadedModule>,
    disabled: Vec<LoadedModule>,
}

impl ModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiates every registered module the config does not skip, then sorts them by
    /// priority and store name.
    pub fn load_all(&mut self, registry: &ModuleRegistry, env: &ModuleEnv) -> Result<()> {
        let config = &env.config;
        let mut candidates: Vec<&ModuleDescriptor> = Vec::new();
        if config.skip_all_internal_modules {
            info!("Skipping all internal modules");
        } else {
            candidates.extend(
                registry
                    .internal()
                    .filter(|d| !config.skip_internal_modules.contains(&d.name)),
            );
        }
        candidates.extend(
            registry
                .user()
                .filter(|d| !config.skip_modules.contains(&d.name)),
        );

        let mut seen: HashSet<String> = self
            .modules
            .iter()
            .chain(&self.disabled)
            .map(|m| m.store_name.clone())
            .collect();
        let mut loaded = Vec::new();
        for descriptor in candidates {
            let store_name = descriptor.store_name();
            if !seen.insert(store_name.clone()) {
                error!(module = %store_name, "Duplicate module name, ignored");
                continue;
            }

            let module = match (descriptor.factory)(env) {
                Ok(module) => module,
                Err(e) if config.ignore_module_init_error => {
                    error!(module = %store_name, error = %e, "Failed to init module, skipped");
                    continue;
                }
                Err(e) => {
                    return Err(e.context(format!("Failed to init module {}", store_name)));
                }
            };

            let priority = module.priority();
            if !(MIN_PRIORITY..MAX_PRIORITY).contains(&priority) {
                anyhow::bail!(
                    "Module {} has priority {} outside [{}, {})",
                    store_name,
                    priority,
                    MIN_PRIORITY,
                    MAX_PRIORITY
                );
            }

            info!(module = %store_name, priority, "Module loaded");
            loaded.push(LoadedModule {
                name: descriptor.name.clone(),
                store_name,
                internal: descriptor.internal,
                priority,
                module,
            });
        }

        self.modules.extend(loaded);
        self.modules
            .sort_by(|a, b| (a.priority, &a.store_name).cmp(&(b.priority, &b.store_name)));
        Ok(())
    }

    /// Drops every module and loads again.
    pub fn reload_all(&mut self, registry: &ModuleRegistry, env: &ModuleEnv) -> Result<()> {
        self.clear();
        self.load_all(registry, env)
    }

    /// Looks up by store name, enabled modules first.
    pub fn get_module(&self, store_name: &str) -> Option<&LoadedModule> {
        self.modules
            .iter()
            .chain(&self.disabled)
            .find(|m| m.store_name == store_name)
    }

    pub fn get_module_as<T: BotModule>(&self) -> Option<Arc<T>> {
        self.modules
            .iter()
            .chain(&self.disabled)
            .find_map(LoadedModule::downcast::<T>)
    }

    /// Enabled modules in load order.
    pub fn enabled_modules(&self) -> &[LoadedModule] {
        &self.modules
    }

    pub fn disabled_modules(&self) -> &[LoadedModule] {
        &self.disabled
    }

    pub fn disable_module(&mut self, store_name: &str) -> Result<()> {
        let pos = self
            .modules
            .iter()
            .position(|m| m.store_name == store_name)
            .ok_or_else(|| anyhow::anyhow!("Module {} not found", store_name))?;
        self.disable_at(pos);
        Ok(())
    }

    pub fn disable_module_as<T: BotModule>(&mut self) -> Result<()> {
        let pos = self
            .modules
            .iter()
            .position(|m| m.downcast::<T>().is_some())
            .ok_or_else(|| anyhow::anyhow!("Module {} not found", std::any::type_name::<T>()))?;
        self.disable_at(pos);
        Ok(())
    }

    fn disable_at(&mut self, pos: usize) {
        let module = self.modules.remove(pos);
        warn!(module = %module.store_name, "Module disabled");
        self.disabled.push(module);
    }

    pub fn clear(&mut self) {
        self.modules.clear();
        self.disabled.clear();
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
