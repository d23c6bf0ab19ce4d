//! Wraps teloxide::Bot and implements [`modbot_core::Bot`]. Production code sends messages via Telegram; tests can substitute another Bot impl.

use async_trait::async_trait;
use modbot_core::{
    Bot as CoreBot, BotApiError, InlineKeyboard, ParseMode, SendOptions, SentMessage, ToCoreUser,
    User,
};
use teloxide::prelude::*;
use teloxide::types::{
    ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ReplyParameters,
};
use teloxide::{ApiError, RequestError};
use tracing::debug;

use crate::adapters::TelegramUserWrapper;

/// Thin wrapper around teloxide::Bot that implements modbot-core's Bot trait.
#[derive(Clone)]
pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
}

impl TelegramBotAdapter {
    /// Creates an adapter from an existing teloxide Bot.
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }

    /// Returns the underlying teloxide::Bot for direct API use when needed.
    pub fn inner(&self) -> &teloxide::Bot {
        &self.bot
    }
}

/// Classifies a teloxide request failure so the retry and fallback logic can act on it.
pub fn map_request_error(err: RequestError) -> BotApiError {
    match err {
        RequestError::Api(ApiError::InvalidToken) => BotApiError::InvalidToken,
        RequestError::Api(api @ ApiError::MessageToReplyNotFound) => {
            BotApiError::ReplyNotFound(api.to_string())
        }
        RequestError::Api(api) => {
            let text = api.to_string();
            let lower = text.to_lowercase();
            if lower.contains("message to be replied not found") {
                BotApiError::ReplyNotFound(text)
            } else if lower.contains("forbidden") || lower.contains("blocked") {
                BotApiError::Forbidden(text)
            } else {
                BotApiError::BadRequest(text)
            }
        }
        RequestError::RetryAfter(secs) => BotApiError::RetryAfter(secs.duration()),
        RequestError::MigrateToChatId(chat_id) => BotApiError::ChatMigrated(chat_id.0),
        RequestError::Network(e) => BotApiError::Network(e.to_string()),
        RequestError::Io(e) => BotApiError::Network(e.to_string()),
        other => BotApiError::Other(other.to_string()),
    }
}

#[allow(deprecated)]
fn to_teloxide_parse_mode(mode: ParseMode) -> teloxide::types::ParseMode {
    match mode {
        ParseMode::Markdown => teloxide::types::ParseMode::Markdown,
        ParseMode::MarkdownV2 => teloxide::types::ParseMode::MarkdownV2,
        ParseMode::Html => teloxide::types::ParseMode::Html,
    }
}

fn to_markup(keyboard: &InlineKeyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.iter().map(|row| {
        row.iter()
            .map(|b| InlineKeyboardButton::callback(b.text.clone(), b.callback_data.clone()))
            .collect::<Vec<_>>()
    }))
}

#[async_trait]
impl CoreBot for TelegramBotAdapter {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        options: &SendOptions,
    ) -> Result<SentMessage, BotApiError> {
        let mut req = self.bot.send_message(ChatId(chat_id), text.to_string());
        if let Some(reply_to) = options.reply_to {
            req = req.reply_parameters(ReplyParameters::new(MessageId(reply_to)));
        }
        if let Some(mode) = options.parse_mode {
            req = req.parse_mode(to_teloxide_parse_mode(mode));
        }
        if let Some(ref keyboard) = options.keyboard {
            req = req.reply_markup(to_markup(keyboard));
        }
        let sent = req.await.map_err(map_request_error)?;
        debug!(chat_id, message_id = sent.id.0, "Sent message");
        Ok(SentMessage {
            chat_id: sent.chat.id.0,
            message_id: sent.id.0,
        })
    }

    async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), BotApiError> {
        let mut req = self
            .bot
            .edit_message_text(ChatId(chat_id), MessageId(message_id), text.to_string());
        if let Some(keyboard) = keyboard {
            req = req.reply_markup(to_markup(keyboard));
        }
        req.await.map_err(map_request_error)?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), BotApiError> {
        self.bot
            .delete_message(ChatId(chat_id), MessageId(message_id))
            .await
            .map_err(map_request_error)?;
        Ok(())
    }

    async fn bot_user(&self) -> Option<User> {
        let me = self.bot.get_me().await.ok()?;
        Some(TelegramUserWrapper(&me.user).to_core())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modbot_core::InlineButton;
    use std::time::Duration;
    use teloxide::types::Seconds;

    /// **Test: Invalid token, blocked bot and other API errors are classified.**
    #[test]
    fn test_map_api_errors() {
        assert_eq!(
            map_request_error(RequestError::Api(ApiError::InvalidToken)),
            BotApiError::InvalidToken
        );
        assert!(matches!(
            map_request_error(RequestError::Api(ApiError::BotBlocked)),
            BotApiError::Forbidden(_)
        ));
        assert!(matches!(
            map_request_error(RequestError::Api(ApiError::Unknown(
                "Bad Request: chat not found".to_string()
            ))),
            BotApiError::BadRequest(_)
        ));
    }

    /// **Test: A deleted reply target maps to ReplyNotFound with teloxide's description.**
    #[test]
    fn test_map_reply_not_found() {
        match map_request_error(RequestError::Api(ApiError::MessageToReplyNotFound)) {
            BotApiError::ReplyNotFound(text) => {
                assert_eq!(text, "Bad Request: message to be replied not found")
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(
            map_request_error(RequestError::Api(ApiError::Unknown(
                "Bad Request: message to be replied not found".to_string()
            ))),
            BotApiError::ReplyNotFound(_)
        ));
    }

    /// **Test: Flood control and chat migration keep their payloads.**
    #[test]
    fn test_map_retry_after_and_migration() {
        assert_eq!(
            map_request_error(RequestError::RetryAfter(Seconds::from_seconds(3))),
            BotApiError::RetryAfter(Duration::from_secs(3))
        );
        assert_eq!(
            map_request_error(RequestError::MigrateToChatId(ChatId(-100123))),
            BotApiError::ChatMigrated(-100123)
        );
    }

    /// **Test: Core keyboard rows become teloxide markup rows in order.**
    #[test]
    fn test_to_markup_keeps_layout() {
        let keyboard = InlineKeyboard::new(vec![
            vec![
                InlineButton::callback("a", "p:0"),
                InlineButton::callback("b", "p:1"),
            ],
            vec![InlineButton::callback("c", "p:2")],
        ]);
        let markup = to_markup(&keyboard);
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0].len(), 2);
        assert_eq!(markup.inline_keyboard[1][0].text, "c");
    }
}
