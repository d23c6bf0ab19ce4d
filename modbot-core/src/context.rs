//! Per-update context handed to every handler.

use std::sync::Arc;

use tracing::debug;

use crate::bot::Bot;
use crate::error::{HandlerError, PermissionError, Result};
use crate::lang::{LangRegistry, LangText};
use crate::permission::{permission_check, CheckLevel, ConditionLimit};
use crate::send::send_long;
use crate::types::{ChatKind, SendOptions, SentMessage, Update};

/// Everything a handler needs about the update it is processing, plus the bot to answer with.
///
/// Built once per update by the framework; handlers receive it by reference.
#[derive(Clone)]
pub struct UpdateContext {
    pub update: Update,
    pub bot: Arc<dyn Bot>,
    pub lang: Arc<LangRegistry>,
    pub master_id: i64,
    /// The bot's own username, used to match `/cmd@username`.
    pub bot_username: Option<String>,
    /// Effective chat id; for a callback without message, the user's id.
    pub chat_id: i64,
    pub user_id: Option<i64>,
    pub message_id: Option<i32>,
    pub reply_to_message_id: Option<i32>,
    pub chat_kind: Option<ChatKind>,
    /// Whitespace-separated words after the command.
    pub args: Vec<String>,
}

impl UpdateContext {
    pub fn new(
        update: Update,
        bot: Arc<dyn Bot>,
        lang: Arc<LangRegistry>,
        master_id: i64,
        bot_username: Option<String>,
    ) -> Self {
        let user_id = update.effective_user().map(|u| u.id);
        let chat_id = update
            .effective_chat()
            .map(|c| c.id)
            .or(user_id)
            .unwrap_or_default();
        let chat_kind = update.effective_chat().map(|c| c.kind);
        let args = update
            .text()
            .and_then(crate::types::parse_command)
            .map(|cmd| cmd.rest.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        Self {
            message_id: update.message_id(),
            reply_to_message_id: update.reply_to_message_id(),
            update,
            bot,
            lang,
            master_id,
            bot_username,
            chat_id,
            user_id,
            chat_kind,
            args,
        }
    }

    pub fn is_private_chat(&self) -> bool {
        self.chat_kind == Some(ChatKind::Private)
    }

    pub fn is_group_chat(&self) -> bool {
        matches!(self.chat_kind, Some(ChatKind::Group | ChatKind::Supergroup))
    }

    pub fn is_channel_message(&self) -> bool {
        self.chat_kind == Some(ChatKind::Channel)
    }

    pub fn is_callback_query(&self) -> bool {
        self.update.is_callback_query()
    }

    pub fn chat_type_str(&self) -> &'static str {
        self.chat_kind.map(|k| k.as_str()).unwrap_or("")
    }

    pub fn get_key(&self) -> (i64, Option<i64>) {
        (self.chat_id, self.user_id)
    }

    /// Text after the command name, keeping its line breaks; errors when there is none.
    pub fn message_after_command(&self) -> Result<&str> {
        let text = self.update.text().ok_or(HandlerError::NoText)?;
        let rest = crate::types::parse_command(text)
            .map(|cmd| cmd.rest)
            .unwrap_or(text);
        if rest.is_empty() {
            return Err(HandlerError::EmptyContent.into());
        }
        Ok(rest)
    }

    /// Resolves `text` in the caller's locale.
    pub fn t(&self, text: &LangText) -> &'static str {
        self.lang.t(text, self.user_id)
    }

    pub fn check(&self, level: CheckLevel, limit: ConditionLimit) -> std::result::Result<(), PermissionError> {
        permission_check(self, level, limit)
    }

    /// Sends `text` into the current chat, replying to the current message.
    pub async fn reply(&self, text: &str) -> Result<SentMessage> {
        self.reply_with(text, SendOptions::default()).await
    }

    /// Like [`UpdateContext::reply`]. An explicit `reply_to` wins; callback queries are not
    /// replied to.
    pub async fn reply_with(&self, text: &str, options: SendOptions) -> Result<SentMessage> {
        let sent = self.reply_parts(text, options).await?;
        last_part(sent)
    }

    /// Sends into the current chat and returns every part sent.
    pub async fn reply_parts(&self, text: &str, mut options: SendOptions) -> Result<Vec<SentMessage>> {
        if options.reply_to.is_none() && !self.is_callback_query() {
            options.reply_to = self.message_id;
        }
        debug!(chat_id = self.chat_id, "reply");
        Ok(send_long(self.bot.as_ref(), self.chat_id, text, &options).await?)
    }

    /// Replies to a specific message of the current chat.
    pub async fn reply_to(&self, message_id: i32, text: &str) -> Result<SentMessage> {
        let options = SendOptions {
            reply_to: Some(message_id),
            ..SendOptions::default()
        };
        self.reply_with(text, options).await
    }

    pub async fn send_to(&self, chat_id: i64, text: &str) -> Result<SentMessage> {
        self.send_to_with(chat_id, text, SendOptions::default()).await
    }

    pub async fn send_to_with(&self, chat_id: i64, text: &str, options: SendOptions) -> Result<SentMessage> {
        let sent = send_long(self.bot.as_ref(), chat_id, text, &options).await?;
        last_part(sent)
    }

    pub async fn success_info(&self, text: &str) -> Result<bool> {
        self.reply(text).await?;
        Ok(true)
    }

    pub async fn error_info(&self, text: &str) -> Result<bool> {
        self.reply(text).await?;
        Ok(false)
    }
}

fn last_part(sent: Vec<SentMessage>) -> Result<SentMessage> {
    sent.into_iter()
        .last()
        .ok_or_else(|| HandlerError::EmptyContent.into())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::error::BotApiError;
    use crate::types::{CallbackQuery, Chat, InlineKeyboard, Message, User};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    /// Records every text sent, with its options.
    #[derive(Default)]
    pub struct RecordingBot {
        pub sent: Mutex<Vec<(i64, String, SendOptions)>>,
    }

    #[async_trait]
    impl Bot for RecordingBot {
        async fn send_text(
            &self,
            chat_id: i64,
            text: &str,
            options: &SendOptions,
        ) -> std::result::Result<SentMessage, BotApiError> {
            let mut sent = self.sent.lock().unwrap();
            sent.push((chat_id, text.to_string(), options.clone()));
            Ok(SentMessage {
                chat_id,
                message_id: 100 + sent.len() as i32,
            })
        }

        async fn edit_text(
            &self,
            _chat_id: i64,
            _message_id: i32,
            _text: &str,
            _keyboard: Option<&InlineKeyboard>,
        ) -> std::result::Result<(), BotApiError> {
            Ok(())
        }

        async fn delete_message(&self, _chat_id: i64, _message_id: i32) -> std::result::Result<(), BotApiError> {
            Ok(())
        }
    }

    pub fn message(chat_id: i64, kind: ChatKind, user_id: i64, text: &str) -> Message {
        Message {
            id: 1,
            chat: Chat { id: chat_id, kind },
            from: Some(User::new(user_id)),
            text: Some(text.to_string()),
            reply_to: None,
            forward_origin: None,
            date: Utc::now(),
        }
    }

    pub fn message_update(chat_id: i64, kind: ChatKind, user_id: i64, text: &str) -> Update {
        Update::Message(message(chat_id, kind, user_id, text))
    }

    pub fn callback_update(chat_id: i64, user_id: i64, data: &str) -> Update {
        Update::CallbackQuery(CallbackQuery {
            id: "cb".to_string(),
            from: User::new(user_id),
            message: Some(message(chat_id, ChatKind::Private, user_id, "menu")),
            data: Some(data.to_string()),
        })
    }

    pub fn context_with(update: Update, master_id: i64, bot: Arc<RecordingBot>) -> UpdateContext {
        UpdateContext::new(update, bot, Arc::new(LangRegistry::new("en")), master_id, None)
    }

    pub fn context_for(update: Update, master_id: i64) -> UpdateContext {
        context_with(update, master_id, Arc::new(RecordingBot::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::lang::BasicLanguage;

    #[test]
    fn test_context_fields_from_message() {
        let ctx = context_for(message_update(-42, ChatKind::Group, 7, "/echo a  b"), 1);
        assert_eq!(ctx.get_key(), (-42, Some(7)));
        assert_eq!(ctx.args, vec!["a", "b"]);
        assert!(ctx.is_group_chat());
        assert_eq!(ctx.chat_type_str(), "group");
        assert_eq!(ctx.message_after_command().unwrap(), "a  b");
    }

    #[test]
    fn test_message_after_command_empty() {
        let ctx = context_for(message_update(1, ChatKind::Private, 1, "/echo"), 1);
        assert!(ctx.message_after_command().is_err());
    }

    #[tokio::test]
    async fn test_reply_targets_current_message() {
        let bot = Arc::new(RecordingBot::default());
        let ctx = context_with(message_update(5, ChatKind::Private, 5, "hi"), 1, bot.clone());
        let sent = ctx.reply("hello").await.unwrap();
        assert_eq!(sent.chat_id, 5);
        let sent = bot.sent.lock().unwrap();
        assert_eq!(sent[0].1, "hello");
        assert_eq!(sent[0].2.reply_to, Some(1));
    }

    #[tokio::test]
    async fn test_callback_reply_is_not_a_reply() {
        let bot = Arc::new(RecordingBot::default());
        let ctx = context_with(callback_update(5, 5, "vote:1"), 1, bot.clone());
        assert!(ctx.success_info("ok").await.unwrap());
        assert!(!ctx.error_info("no").await.unwrap());
        let sent = bot.sent.lock().unwrap();
        assert!(sent.iter().all(|(_, _, opts)| opts.reply_to.is_none()));
    }

    #[tokio::test]
    async fn test_t_uses_user_locale() {
        let ctx = context_for(message_update(5, ChatKind::Private, 5, "hi"), 1);
        ctx.lang.set_lang(5, "zh-CN");
        assert_eq!(ctx.t(&BasicLanguage::END), "结束");
    }
}
