//! # modbot-core
//!
//! Core types and traits for the bot framework: [`Bot`], [`UpdateContext`], update and keyboard
//! types, permission checks, text splitting, multi-language lookup and tracing initialization.
//! Transport-agnostic; used by modbot-telegram, modbot-chain and the framework.

pub mod bot;
pub mod context;
pub mod error;
pub mod lang;
pub mod logger;
pub mod permission;
pub mod send;
pub mod text;
pub mod types;

pub use bot::Bot;
pub use context::UpdateContext;
pub use error::{BotApiError, HandlerError, ModbotError, PermissionError, Result};
pub use lang::{format_text, BasicLanguage, LangError, LangRegistry, LangTable, LangText};
pub use logger::{init_tracing, LogHandle};
pub use permission::{permission_check, CheckLevel, ConditionLimit};
pub use send::{delete_with_retries, retry_call, send_long, send_with_fallback};
pub use text::{longtext_split, markdown_escape, markdown_v2_escape, trim_spaces_before_line};
pub use types::{
    flatten_buttons, parse_command, CallbackQuery, Chat, ChatKind, ForwardOrigin, InlineButton,
    InlineKeyboard, Message, ParseMode, ParsedCommand, SendOptions, SentMessage, ToCoreMessage,
    ToCoreUser, Update, User,
};
