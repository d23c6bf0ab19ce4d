//! Shared stop/restart flags and the handle modules use to reach the framework.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use modbot_callback::SharedCallbackStore;
use modbot_core::{send_long, Bot, LangRegistry, LangText, SendOptions};
use modbot_storage::DatabaseRegistry;
use tokio::sync::Notify;
use tracing::{error, info};

use crate::config::BotConfig;

/// Set by `/stop`, `/restart` or a signal; the runner waits on [`StopSignal::notify`].
#[derive(Default)]
pub struct StopSignal {
    notify: Arc<Notify>,
    requested: AtomicBool,
    restart: AtomicBool,
    exit_fast: AtomicBool,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop. Only the first request counts.
    pub fn request(&self, restart: bool) -> bool {
        if self.requested.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.restart.store(restart, Ordering::SeqCst);
        info!(restart, "Stop requested");
        self.notify.notify_one();
        true
    }

    /// Stop without post-stop extras such as git pull.
    pub fn request_fast(&self) -> bool {
        self.exit_fast.store(true, Ordering::SeqCst);
        self.request(false)
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    pub fn restart_requested(&self) -> bool {
        self.restart.load(Ordering::SeqCst)
    }

    pub fn exit_fast(&self) -> bool {
        self.exit_fast.load(Ordering::SeqCst)
    }

    pub fn notify(&self) -> Arc<Notify> {
        self.notify.clone()
    }
}

/// Cheap clone of the framework's shared parts, passed to module hooks.
#[derive(Clone)]
pub struct FrameworkHandle {
    pub config: Arc<BotConfig>,
    pub bot: Arc<dyn Bot>,
    pub lang: Arc<LangRegistry>,
    pub callbacks: SharedCallbackStore,
    pub databases: Arc<DatabaseRegistry>,
    pub(crate) stop: Arc<StopSignal>,
}

impl FrameworkHandle {
    pub fn master_id(&self) -> i64 {
        self.config.master_id
    }

    /// Text in the master's locale.
    pub fn t(&self, text: &LangText) -> &'static str {
        self.lang.t(text, Some(self.config.master_id))
    }

    /// Sends `text` to the master. Failures are logged, not returned.
    pub async fn send_to_master(&self, text: &str) {
        if let Err(e) = send_long(
            self.bot.as_ref(),
            self.config.master_id,
            text,
            &SendOptions::default(),
        )
        .await
        {
            error!(error = %e, master_id = self.config.master_id, "Failed to send to master");
        }
    }

    pub fn request_stop(&self, restart: bool) -> bool {
        self.stop.request(restart)
    }

    pub fn stop_signal(&self) -> Arc<StopSignal> {
        self.stop.clone()
    }
}
