//! Bot configuration loaded from environment variables (after `dotenvy::dotenv()` in the binary).

use anyhow::{Context, Result};
use modbot_telegram::TelegramConfig;
use std::env;
use std::path::PathBuf;
use std::time::Duration;


pub const DEFAULT_LOCALE: &str = "en";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_LOG_FILE: &str = "logs/modbot.log";
pub const DEFAULT_CALLBACK_DATA_TTL_SECS: u64 = 24 * 60 * 60;

/// Everything the framework reads from the environment.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    /// Operator account: receives startup/shutdown notices and error reports.
    pub master_id: i64,
    pub locale: String,
    pub data_dir: PathBuf,
    pub log_file: String,
    /// Custom Bot API server. Env: `TELEGRAM_API_URL` or `TELOXIDE_API_URL`.
    pub telegram_api_url: Option<String>,
    pub skip_modules: Vec<String>,
    pub skip_internal_modules: Vec<String>,
    pub skip_all_internal_modules: bool,
    pub ignore_module_init_error: bool,
    pub pull_when_stop: bool,
    pub systemd_service_name: Option<String>,
    /// Restart through `systemctl --user` rather than the system manager.
    pub systemd_user_service: bool,
    pub callback_data_ttl: Duration,
}

impl BotConfig {
    /// Defaults for everything but the token and master id.
    pub fn new(bot_token: impl Into<String>, master_id: i64) -> Self {
        Self {
            bot_token: bot_token.into(),
            master_id,
            locale: DEFAULT_LOCALE.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            log_file: DEFAULT_LOG_FILE.to_string(),
            telegram_api_url: None,
            skip_modules: Vec::new(),
            skip_internal_modules: Vec::new(),
            skip_all_internal_modules: false,
            ignore_module_init_error: false,
            pull_when_stop: false,
            systemd_service_name: None,
            systemd_user_service: false,
            callback_data_ttl: Duration::from_secs(DEFAULT_CALLBACK_DATA_TTL_SECS),
        }
    }

    /// Loads from the environment. `token` overrides BOT_TOKEN when given.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(token) => token,
            None => env::var("BOT_TOKEN").map_err(|_| anyhow::anyhow!("BOT_TOKEN not set"))?,
        };
        let master_id = env::var("MASTER_ID")
            .map_err(|_| anyhow::anyhow!("MASTER_ID not set"))?
            .trim()
            .parse::<i64>()
            .context("MASTER_ID must be an integer id")?;

        let mut config = Self::new(bot_token, master_id);
        if let Ok(locale) = env::var("LOCALE") {
            config.locale = locale;
        }
        if let Ok(dir) = env::var("DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(log_file) = env::var("LOG_FILE") {
            config.log_file = log_file;
        }
        config.telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();
        config.skip_modules = env_list("SKIP_LOAD_MODULES");
        config.skip_internal_modules = env_list("SKIP_LOAD_INTERNAL_MODULES");
        config.skip_all_internal_modules = env_bool("SKIP_LOAD_ALL_INTERNAL_MODULES", false)?;
        config.ignore_module_init_error = env_bool("IGNORE_MODULE_INIT_ERROR", false)?;
        config.pull_when_stop = env_bool("PULL_WHEN_STOP", false)?;
        config.systemd_service_name = env::var("SYSTEMD_SERVICE_NAME")
            .ok()
            .filter(|s| !s.trim().is_empty());
        config.systemd_user_service = env_bool("SYSTEMD_USER_SERVICE", false)?;
        if let Ok(ttl) = env::var("CALLBACK_DATA_TTL_SECS") {
            let secs = ttl
                .trim()
                .parse::<u64>()
                .with_context(|| format!("CALLBACK_DATA_TTL_SECS is not a number: {}", ttl))?;
            config.callback_data_ttl = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            anyhow::bail!("BOT_TOKEN is empty");
        }
        if let Some(ref url_str) = self.telegram_api_url {
            if reqwest::Url::parse(url_str).is_err() {
                anyhow::bail!(
                    "TELEGRAM_API_URL (or TELOXIDE_API_URL) is set but not a valid URL: {}",
                    url_str
                );
            }
        }
        if self.locale.trim().is_empty() {
            anyhow::bail!("LOCALE is empty");
        }
        Ok(())
    }

    /// Transport-only view used by the dispatcher runner.
    pub fn telegram(&self) -> TelegramConfig {
        TelegramConfig {
            bot_token: self.bot_token.clone(),
            telegram_api_url: self.telegram_api_url.clone(),
            log_file: Some(self.log_file.clone()),
        }
    }
}

fn env_list(key: &str) -> Vec<String> {
    env::var(key)
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn env_bool(key: &str, default: bool) -> Result<bool> {
    let Ok(value) = env::var(key) else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{} must be a boolean, got {}", key, other),
    }
}
