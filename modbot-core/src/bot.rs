//! Bot abstraction for sending, editing and deleting messages.
//!
//! [`Bot`] is transport-agnostic; the teloxide implementation lives in `modbot-telegram`,
//! tests substitute a recording mock.

use crate::error::BotApiError;
use crate::types::{InlineKeyboard, SendOptions, SentMessage, User};
use async_trait::async_trait;

/// Abstraction over the Bot API calls the framework needs. Every call is a single request;
/// splitting and retrying live in [`crate::send`].
#[async_trait]
pub trait Bot: Send + Sync {
    /// Sends one text message (at most one Telegram message worth of text).
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        options: &SendOptions,
    ) -> std::result::Result<SentMessage, BotApiError>;

    /// Replaces the text (and keyboard) of an already-sent message.
    async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> std::result::Result<(), BotApiError>;

    async fn delete_message(
        &self,
        chat_id: i64,
        message_id: i32,
    ) -> std::result::Result<(), BotApiError>;

    /// The bot's own account, if known.
    async fn bot_user(&self) -> Option<User> {
        None
    }
}
