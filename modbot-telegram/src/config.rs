//! Minimal transport config: token, API URL, log path.
//! Loaded from the environment variables BOT_TOKEN, TELEGRAM_API_URL (or TELOXIDE_API_URL), LOG_FILE.

use anyhow::{Context, Result};
use std::env;
use tracing::error;

/// Telegram connectivity settings (bot token, optional Bot API server, log file).
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub telegram_api_url: Option<String>,
    pub log_file: Option<String>,
}

impl TelegramConfig {
    /// Loads from env: BOT_TOKEN is required, TELEGRAM_API_URL and LOG_FILE are optional.
    pub fn from_env() -> Result<Self> {
        let bot_token = env::var("BOT_TOKEN").map_err(|_| anyhow::anyhow!("BOT_TOKEN not set"))?;
        let telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();
        let log_file = env::var("LOG_FILE").ok();
        Ok(Self {
            bot_token,
            telegram_api_url,
            log_file,
        })
    }

    /// Uses the given token; everything else unset.
    pub fn with_token(bot_token: String) -> Self {
        Self {
            bot_token,
            telegram_api_url: None,
            log_file: None,
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.telegram_api_url = Some(url.into());
        self
    }

    /// Parsed API URL; an unparsable value is an error naming the variable.
    pub fn api_url(&self) -> Result<Option<reqwest::Url>> {
        self.telegram_api_url
            .as_deref()
            .map(|url_str| {
                reqwest::Url::parse(url_str).with_context(|| {
                    format!(
                        "TELEGRAM_API_URL (or TELOXIDE_API_URL) is set but not a valid URL: {}",
                        url_str
                    )
                })
            })
            .transpose()
    }

    /// Builds the teloxide bot, pointed at the custom API server when one is configured.
    /// An invalid URL is logged and the default server is used.
    pub fn build_bot(&self) -> teloxide::Bot {
        let bot = teloxide::Bot::new(self.bot_token.clone());
        match self.api_url() {
            Ok(Some(url)) => bot.set_api_url(url),
            Ok(None) => bot,
            Err(e) => {
                error!(error = %e, "Invalid TELEGRAM_API_URL, using default");
                bot
            }
        }
    }
}
