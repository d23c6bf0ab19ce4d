//! CLI parser and config loading.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use modbot::{BotConfig, ModuleEnv, ModuleLoader, ModuleRegistry};
use modbot_callback::CallbackStore;
use modbot_core::LangRegistry;
use modbot_storage::DatabaseRegistry;

#[derive(Parser, Debug)]
#[command(name = "modbot")]
#[command(about = "Modular Telegram bot", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (config from env; token can override BOT_TOKEN).
    Run {
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Load every registered module and print the load order.
    Modules,
    /// Validate the configuration and print it without the token.
    CheckConfig,
}

/// Load BotConfig from environment. If `token` is provided it overrides BOT_TOKEN.
pub fn load_config(token: Option<String>) -> Result<BotConfig> {
    BotConfig::load(token)
}

/// `priority  store_name  [internal]` lines in load order.
pub fn module_table(config: BotConfig, registry: &ModuleRegistry) -> Result<Vec<String>> {
    let env = ModuleEnv::new(
        Arc::new(config.clone()),
        Arc::new(DatabaseRegistry::new()),
        CallbackStore::shared(),
        Arc::new(LangRegistry::new(config.locale)),
    );
    let mut loader = ModuleLoader::new();
    loader.load_all(registry, &env)?;
    Ok(loader
        .enabled_modules()
        .iter()
        .map(|m| {
            let kind = if m.internal { "internal" } else { "user" };
            format!("{:>3}  {:<24} {}", m.priority, m.store_name, kind)
        })
        .collect())
}

/// Config summary for `check-config`. The token is never printed.
pub fn describe_config(config: &BotConfig) -> Vec<String> {
    vec![
        format!("master_id: {}", config.master_id),
        format!("locale: {}", config.locale),
        format!("data_dir: {}", config.data_dir.display()),
        format!("log_file: {}", config.log_file),
        format!(
            "telegram_api_url: {}",
            config.telegram_api_url.as_deref().unwrap_or("(default)")
        ),
        format!("skip_modules: {:?}", config.skip_modules),
        format!("skip_internal_modules: {:?}", config.skip_internal_modules),
        format!("skip_all_internal_modules: {}", config.skip_all_internal_modules),
        format!("ignore_module_init_error: {}", config.ignore_module_init_error),
        format!("pull_when_stop: {}", config.pull_when_stop),
        format!(
            "systemd_service_name: {}",
            config.systemd_service_name.as_deref().unwrap_or("(none)")
        ),
        format!("systemd_user_service: {}", config.systemd_user_service),
        format!("callback_data_ttl: {}s", config.callback_data_ttl.as_secs()),
    ]
}
