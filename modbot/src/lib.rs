//! # modbot
//!
//! Module framework on top of modbot-core: modules register with a [`ModuleRegistry`], the
//! [`ModuleLoader`] instantiates them in priority order, and the [`Framework`] collects their
//! handlers into one chain next to the built-in commands. [`run_bot`] wires it to Telegram.

pub mod builtins;
pub mod config;
pub mod error_report;
pub mod framework;
pub mod handle;
pub mod helpers;
pub mod loader;
pub mod module;
pub mod registry;
pub mod runner;

pub use config::BotConfig;
pub use error_report::report_error;
pub use framework::{run_daily, until_next_midnight, Framework};
pub use handle::{FrameworkHandle, StopSignal};
pub use helpers::ModuleHelpers;
pub use loader::{LoadedModule, ModuleLoader};
pub use module::{BotModule, ModuleEnv, DEFAULT_PRIORITY, MAX_PRIORITY, MIN_PRIORITY};
pub use registry::{ModuleDescriptor, ModuleFactory, ModuleRegistry, INTERNAL_PREFIX};
pub use runner::run_bot;
