//! The bot instance: loaded modules, the handler chain and the lifecycle hooks around them.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use modbot_callback::{CallbackStore, SharedCallbackStore};
use modbot_chain::HandlerChain;
use modbot_core::{BasicLanguage, Bot, LangRegistry, LogHandle, Update, UpdateContext};
use modbot_storage::DatabaseRegistry;
use modbot_telegram::UpdateSink;
use tokio::sync::RwLock;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, instrument, warn};

use crate::builtins::{builtin_handlers, BuiltinState};
use crate::config::BotConfig;
use crate::error_report::report_error;
use crate::handle::{FrameworkHandle, StopSignal};
use crate::helpers::ModuleHelpers;
use crate::loader::ModuleLoader;
use crate::module::ModuleEnv;
use crate::registry::ModuleRegistry;

const GIT_PULL_FAILED: &str = "git pull failed!";
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy)]
enum Hook {
    PostInit,
    Stop,
    Daily,
}

pub struct Framework {
    config: Arc<BotConfig>,
    bot: Arc<dyn Bot>,
    registry: ModuleRegistry,
    lang: Arc<LangRegistry>,
    callbacks: SharedCallbackStore,
    databases: Arc<DatabaseRegistry>,
    loader: ModuleLoader,
    chain: HandlerChain,
    builtins: Arc<BuiltinState>,
    stop: Arc<StopSignal>,
    bot_username: Arc<RwLock<Option<String>>>,
}

impl Framework {
    pub fn new(
        config: BotConfig,
        bot: Arc<dyn Bot>,
        registry: ModuleRegistry,
        log: Option<LogHandle>,
        databases: Arc<DatabaseRegistry>,
    ) -> Self {
        let stop = Arc::new(StopSignal::new());
        Self {
            lang: Arc::new(LangRegistry::new(config.locale.clone())),
            config: Arc::new(config),
            bot,
            registry,
            callbacks: CallbackStore::shared(),
            databases,
            loader: ModuleLoader::new(),
            chain: HandlerChain::new(),
            builtins: Arc::new(BuiltinState::new(log, stop.clone())),
            stop,
            bot_username: Arc::new(RwLock::new(None)),
        }
    }

    /// Loads the modules and builds the chain: module handlers in load order, then the
    /// built-in commands.
    #[instrument(skip(self))]
    pub fn init(&mut self) -> anyhow::Result<()> {
        let env = ModuleEnv::new(
            self.config.clone(),
            self.databases.clone(),
            self.callbacks.clone(),
            self.lang.clone(),
        );
        self.loader.load_all(&self.registry, &env)?;

        let mut chain = HandlerChain::new();
        for loaded in self.loader.enabled_modules() {
            let entries = loaded.module.clone().handlers();
            debug!(module = %loaded.store_name, handlers = entries.len(), "Collected handlers");
            chain.extend(
                entries
                    .into_iter()
                    .map(|entry| entry.owned_by(loaded.store_name.clone())),
            );
        }
        chain.extend(builtin_handlers(self.builtins.clone()));
        self.builtins.record_help_docs(chain.command_docs());
        self.chain = chain;

        info!(
            modules = self.loader.len(),
            handlers = self.chain.handlers().len(),
            "Framework initialized"
        );
        Ok(())
    }

    /// Runs one update through the chain; failures go to [`report_error`].
    pub async fn dispatch(&self, update: Update) {
        let bot_username = self.bot_username.read().await.clone();
        let ctx = UpdateContext::new(
            update,
            self.bot.clone(),
            self.lang.clone(),
            self.config.master_id,
            bot_username,
        );
        if let Err(err) = self.chain.handle(&ctx).await {
            report_error(&ctx, &self.callbacks, err).await;
        }
    }

    pub async fn post_init(&self) {
        self.run_hooks(Hook::PostInit).await;
        let handle = self.handle();
        handle.send_to_master(handle.t(&BasicLanguage::STARTUP)).await;
        info!("Post init done");
    }

    /// Says goodbye, stops modules, closes databases and optionally pulls the repo.
    #[instrument(skip(self))]
    pub async fn post_stop(&self) {
        let started = Instant::now();
        let handle = self.handle();
        handle
            .send_to_master(handle.t(&BasicLanguage::SHUTDOWN_GOODBYE))
            .await;
        self.run_hooks(Hook::Stop).await;
        info!(elapsed = ?started.elapsed(), "Modules stopped");

        let db_started = Instant::now();
        self.databases.shutdown().await;
        info!(elapsed = ?db_started.elapsed(), "Databases shut down");

        if self.config.pull_when_stop && !self.stop.exit_fast() {
            if let Some(report) = git_pull().await {
                handle.send_to_master(&report).await;
            }
        }
    }

    /// Expires old callback data, then runs every module's daily job.
    pub async fn daily_job(&self) {
        let ttl = chrono::Duration::from_std(self.config.callback_data_ttl)
            .unwrap_or_else(|_| chrono::Duration::days(1));
        let removed = self.callbacks.lock().await.expire_older_than(ttl);
        debug!(keys = ?removed, "Daily job: removed keys from callback manager");
        info!("Running daily jobs for each module");
        self.run_hooks(Hook::Daily).await;
    }

    /// Runs `hook` on every enabled module concurrently. Errors are logged.
    async fn run_hooks(&self, hook: Hook) {
        let mut tasks = JoinSet::new();
        for loaded in self.loader.enabled_modules() {
            let module = loaded.module.clone();
            let name = loaded.store_name.clone();
            let fw = self.handle();
            tasks.spawn(async move {
                let result = match hook {
                    Hook::PostInit => module.post_init(&fw).await,
                    Hook::Stop => module.stop().await,
                    Hook::Daily => module.daily_job(&fw).await,
                };
                (name, result)
            });
        }
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((module, Err(e))) => {
                    error!(module = %module, hook = ?hook, error = ?e, "Module hook failed");
                }
                Err(e) => error!(hook = ?hook, error = %e, "Module hook panicked"),
            }
        }
    }

    pub fn request_stop(&self, restart: bool) -> bool {
        self.stop.request(restart)
    }

    /// `systemctl [--user] restart <name>` with a service name, else this process's command line.
    pub fn restart_command(&self) -> Vec<String> {
        if let Some(name) = &self.config.systemd_service_name {
            let mut command = vec!["systemctl".to_string()];
            if self.config.systemd_user_service {
                command.push("--user".to_string());
            }
            command.push("restart".to_string());
            command.push(name.clone());
            return command;
        }
        let mut command: Vec<String> = std::env::args().collect();
        if let (Ok(exe), Some(first)) = (std::env::current_exe(), command.first_mut()) {
            *first = exe.display().to_string();
        }
        command
    }

    /// Starts [`Framework::restart_command`] as a detached process.
    pub fn spawn_restart(&self) -> anyhow::Result<()> {
        let command = self.restart_command();
        let (program, args) = command
            .split_first()
            .ok_or_else(|| anyhow::anyhow!("empty restart command"))?;
        info!(command = ?command, "Restarting the bot");
        std::process::Command::new(program).args(args).spawn()?;
        Ok(())
    }

    pub fn handle(&self) -> FrameworkHandle {
        FrameworkHandle {
            config: self.config.clone(),
            bot: self.bot.clone(),
            lang: self.lang.clone(),
            callbacks: self.callbacks.clone(),
            databases: self.databases.clone(),
            stop: self.stop.clone(),
        }
    }

    pub fn helpers(&self) -> ModuleHelpers {
        ModuleHelpers::new(self.callbacks.clone())
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn loader(&self) -> &ModuleLoader {
        &self.loader
    }

    pub fn chain(&self) -> &HandlerChain {
        &self.chain
    }

    pub fn callbacks(&self) -> &SharedCallbackStore {
        &self.callbacks
    }

    pub fn lang(&self) -> &Arc<LangRegistry> {
        &self.lang
    }

    pub fn stop_signal(&self) -> Arc<StopSignal> {
        self.stop.clone()
    }

    /// Filled by the dispatcher runner once `getMe` answers.
    pub fn bot_username(&self) -> Arc<RwLock<Option<String>>> {
        self.bot_username.clone()
    }

    /// Documented commands in chain order.
    pub fn help_docs(&self) -> &[(String, String)] {
        self.builtins.help_docs()
    }
}

#[async_trait]
impl UpdateSink for Framework {
    async fn on_update(&self, update: Update) {
        self.dispatch(update).await;
    }
}

/// Runs `git pull --ff-only`. Returns what to tell the master, if anything.
async fn git_pull() -> Option<String> {
    let output = tokio::process::Command::new("git")
        .args(["pull", "--ff-only"])
        .output()
        .await;
    match output {
        Ok(output) if output.status.success() => {
            let msg = String::from_utf8_lossy(&output.stdout).trim().to_string();
            info!(output = %msg, "git pull finished");
            if msg.is_empty()
                || msg.contains("Already up to date.")
                || msg.contains("not a git repository")
            {
                None
            } else {
                Some(msg)
            }
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, stderr = %stderr.trim(), "git pull failed");
            Some(GIT_PULL_FAILED.to_string())
        }
        Err(e) => {
            warn!(error = %e, "git pull could not be started");
            Some(GIT_PULL_FAILED.to_string())
        }
    }
}

/// Time from `now` to the next midnight in `now`'s time zone.
pub fn until_next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    now.date_naive()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .and_then(|midnight| midnight.and_local_timezone(now.timezone()).earliest())
        .and_then(|next| next.signed_duration_since(now.clone()).to_std().ok())
        .unwrap_or(DAY)
}

/// Spawns the daily loop: sleep until local midnight, run [`Framework::daily_job`], repeat.
pub fn run_daily(framework: Arc<Framework>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let wait = until_next_midnight(&Local::now());
            debug!(wait = ?wait, "Daily job scheduled");
            tokio::time::sleep(wait).await;
            if framework.stop.is_requested() {
                break;
            }
            framework.daily_job().await;
        }
    })
}
