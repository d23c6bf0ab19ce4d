//! # modbot-telegram
//!
//! Telegram transport layer: adapters from teloxide types, [`modbot_core::Bot`] implementation,
//! minimal config, and the dispatcher runner feeding updates into an [`UpdateSink`].
//! Handles only Telegram connectivity; dispatch and modules live in the framework.

mod adapters;
mod bot_adapter;
mod config;
mod runner;

pub use adapters::{
    chat_kind, forward_origin, TelegramCallbackWrapper, TelegramMessageWrapper, TelegramUserWrapper,
};
pub use bot_adapter::{map_request_error, TelegramBotAdapter};
pub use config::TelegramConfig;
pub use runner::{run_dispatcher, UpdateSink};
