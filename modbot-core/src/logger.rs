//! Tracing initialization: console and log file share the full fmt layout (level, target, span, fields).
//!
//! The level filter is installed behind a reload layer so `/debug_mode` can switch it at runtime.

use std::fs::OpenOptions;
use std::io;
use std::sync::{Arc, Mutex};

use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter,
    Registry,
};

const DEBUG_DIRECTIVE: &str = "debug";

/// Handle to the global level filter installed by [`init_tracing`].
#[derive(Clone)]
pub struct LogHandle {
    reload: reload::Handle<EnvFilter, Registry>,
    initial: String,
    saved: Arc<Mutex<Option<String>>>,
}

impl LogHandle {
    /// Wraps `filter` in a reload layer. The layer must be part of a live subscriber for the
    /// handle to take effect.
    pub fn new(filter: EnvFilter) -> (reload::Layer<EnvFilter, Registry>, Self) {
        let initial = filter.to_string();
        let (layer, reload) = reload::Layer::new(filter);
        let handle = LogHandle {
            reload,
            initial,
            saved: Arc::new(Mutex::new(None)),
        };
        (layer, handle)
    }

    /// Whether the debug level is currently active.
    pub fn is_debug(&self) -> bool {
        self.reload
            .with_current(|f| f.to_string() == DEBUG_DIRECTIVE)
            .unwrap_or(false)
    }

    /// Whether the process was started with the debug level already on.
    pub fn started_in_debug(&self) -> bool {
        self.initial == DEBUG_DIRECTIVE
    }

    /// Toggles the debug level. Returns the new state (`true` = debug on).
    ///
    /// Turning debug off requires a saved level; when the process started in debug there is none.
    pub fn toggle_debug(&self) -> anyhow::Result<bool> {
        let mut saved = self
            .saved
            .lock()
            .map_err(|_| anyhow::anyhow!("log level state poisoned"))?;
        if self.is_debug() {
            let previous = saved
                .take()
                .ok_or_else(|| anyhow::anyhow!("Invalid state: is the initial log level debug?"))?;
            self.reload
                .modify(|f| *f = EnvFilter::new(&previous))
                .map_err(|e| anyhow::anyhow!("Failed to restore log level: {}", e))?;
            Ok(false)
        } else {
            let current = self
                .reload
                .with_current(|f| f.to_string())
                .map_err(|e| anyhow::anyhow!("Failed to read log level: {}", e))?;
            *saved = Some(current);
            self.reload
                .modify(|f| *f = EnvFilter::new(DEBUG_DIRECTIVE))
                .map_err(|e| anyhow::anyhow!("Failed to set debug level: {}", e))?;
            Ok(true)
        }
    }
}

/// Installs the global tracing subscriber.
/// Output goes to stdout and the log file at once (tee via `MakeWriterExt::and`).
/// The level comes from `RUST_LOG` (info, debug, trace...), default `info`.
/// Load `.env` (e.g. `dotenvy::dotenv()`) before calling, otherwise `RUST_LOG` from it is not seen.
pub fn init_tracing(log_file_path: &str) -> anyhow::Result<LogHandle> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;
    let file = Arc::new(file);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = LogHandle::new(env_filter);

    use tracing_subscriber::fmt::writer::MakeWriterExt;
    let writer = io::stdout.and(file);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    Registry::default()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    Ok(handle)
}
