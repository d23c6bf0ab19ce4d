use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use modbot_core::init_tracing;
use modbot_storage::DatabaseRegistry;
use modbot_telegram::{run_dispatcher, TelegramBotAdapter};
use tracing::{error, info, instrument};

use crate::config::BotConfig;
use crate::framework::{run_daily, Framework};
use crate::handle::StopSignal;
use crate::registry::ModuleRegistry;

/// Main entry: validate config, init logging, load modules, then dispatch until `/stop`,
/// `/restart` or a signal. Post-stop work and the optional restart run before returning.
#[instrument(skip(config, registry))]
pub async fn run_bot(config: BotConfig, registry: ModuleRegistry) -> Result<()> {
    config.validate()?;
    if let Some(dir) = Path::new(&config.log_file).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let log = init_tracing(&config.log_file)?;
    std::fs::create_dir_all(&config.data_dir)?;

    info!(
        master_id = config.master_id,
        locale = %config.locale,
        data_dir = %config.data_dir.display(),
        modules = registry.len(),
        "Initializing bot"
    );

    let teloxide_bot = config.telegram().build_bot();
    let adapter = Arc::new(TelegramBotAdapter::new(teloxide_bot.clone()));
    let mut framework = Framework::new(
        config,
        adapter,
        registry,
        Some(log),
        Arc::new(DatabaseRegistry::new()),
    );
    framework.init()?;
    let framework = Arc::new(framework);

    let stop = framework.stop_signal();
    let signals = tokio::spawn(watch_signals(stop.clone()));
    let daily = run_daily(framework.clone());
    let post_init = {
        let framework = framework.clone();
        tokio::spawn(async move { framework.post_init().await })
    };

    info!("Bot started successfully");
    let dispatched = run_dispatcher(
        teloxide_bot,
        framework.clone(),
        framework.bot_username(),
        stop.notify(),
    )
    .await;

    post_init.abort();
    daily.abort();
    signals.abort();
    if let Err(e) = &dispatched {
        error!(error = %e, "Dispatcher failed");
    }

    framework.post_stop().await;
    if stop.restart_requested() {
        if let Err(e) = framework.spawn_restart() {
            error!(error = %e, "Failed to restart the bot");
        }
    }
    info!("Bot stopped");
    dispatched
}

/// Ctrl-C stops normally; SIGTERM stops without post-stop extras.
async fn watch_signals(stop: Arc<StopSignal>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                stop.request(false);
            }
            _ = term.recv() => {
                stop.request_fast();
            }
        }
    }
    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.request(false);
        }
    }
}
