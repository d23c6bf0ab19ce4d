//! Resilient sending on top of [`Bot`]: long texts are split, transient failures retried,
//! and a bad reply target or broken markup falls back to a plainer request.

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use crate::bot::Bot;
use crate::error::{BotApiError, ModbotError, Result};
use crate::text::longtext_split;
use crate::types::{SendOptions, SentMessage};

pub const RETRY_TIMES: usize = 3;
pub const RETRY_SLEEP: Duration = Duration::from_secs(1);

/// Runs `call` up to [`RETRY_TIMES`] times.
///
/// Fatal errors (see [`BotApiError::is_fatal`]) are returned at once. `RetryAfter(d)` waits
/// `d + 1s` before the next attempt, anything else waits [`RETRY_SLEEP`].
pub async fn retry_call<T, F, Fut>(name: &str, mut call: F) -> std::result::Result<T, BotApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, BotApiError>>,
{
    let mut attempt = 1;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_fatal() || attempt >= RETRY_TIMES => return Err(e),
            Err(e) => {
                warn!(call = name, attempt, max = RETRY_TIMES, error = %e, "retrying");
                let sleep = match &e {
                    BotApiError::RetryAfter(d) => *d + Duration::from_secs(1),
                    _ => RETRY_SLEEP,
                };
                tokio::time::sleep(sleep).await;
                attempt += 1;
            }
        }
    }
}

/// Sends one part with retries. A bad request about the reply target is resent without
/// `reply_to`; one about entity parsing is resent without `parse_mode`.
pub async fn send_with_fallback(
    bot: &dyn Bot,
    chat_id: i64,
    text: &str,
    options: &SendOptions,
) -> std::result::Result<SentMessage, BotApiError> {
    let mut options = options.clone();
    loop {
        let result = retry_call("send_text", || bot.send_text(chat_id, text, &options)).await;
        let description = match &result {
            Err(BotApiError::ReplyNotFound(_)) if options.reply_to.is_some() => {
                error!(chat_id, "reply target not found, retrying without reply_to");
                options.reply_to = None;
                continue;
            }
            Err(BotApiError::BadRequest(description)) => description.to_lowercase(),
            _ => return result,
        };
        let about_reply = description.contains("reply") || description.contains("replied");
        if about_reply && options.reply_to.is_some() {
            error!(chat_id, "send message failed, retrying without reply_to");
            options.reply_to = None;
            continue;
        }
        if description.contains("parse") && options.parse_mode.is_some() {
            error!(chat_id, "send message failed, retrying without parse_mode");
            options.parse_mode = None;
            continue;
        }
        return result;
    }
}

/// Splits `text` into message-sized parts and sends them in order. The keyboard (if any) is
/// attached to the last part only.
pub async fn send_long(
    bot: &dyn Bot,
    chat_id: i64,
    text: &str,
    options: &SendOptions,
) -> std::result::Result<Vec<SentMessage>, BotApiError> {
    let parts = longtext_split(text);
    let last = parts.len().saturating_sub(1);
    let mut part_options = SendOptions {
        keyboard: None,
        ..options.clone()
    };
    let mut sent = Vec::with_capacity(parts.len());
    for (i, part) in parts.iter().enumerate() {
        if i == last {
            part_options.keyboard = options.keyboard.clone();
        }
        sent.push(send_with_fallback(bot, chat_id, part, &part_options).await?);
    }
    Ok(sent)
}

/// Tries to delete a message up to `max_tries` times. `Ok(false)` when every attempt failed.
pub async fn delete_with_retries(
    bot: &dyn Bot,
    chat_id: i64,
    message_id: i32,
    max_tries: usize,
) -> Result<bool> {
    if max_tries == 0 {
        return Err(ModbotError::Unknown(
            "max_tries must be greater than 0".to_string(),
        ));
    }
    for attempt in 1..=max_tries {
        match bot.delete_message(chat_id, message_id).await {
            Ok(()) => return Ok(true),
            Err(e) => {
                warn!(chat_id, message_id, attempt, error = %e, "delete message failed");
            }
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InlineButton, InlineKeyboard, ParseMode, User};
    use crate::text::TEXT_LENGTH_LIMIT;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted results and records the options of each call.
    #[derive(Default)]
    struct ScriptedBot {
        results: Mutex<VecDeque<std::result::Result<(), BotApiError>>>,
        calls: Mutex<Vec<(String, SendOptions)>>,
        deletes: Mutex<usize>,
    }

    impl ScriptedBot {
        fn with(results: Vec<std::result::Result<(), BotApiError>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<(String, SendOptions)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Bot for ScriptedBot {
        async fn send_text(
            &self,
            chat_id: i64,
            text: &str,
            options: &SendOptions,
        ) -> std::result::Result<SentMessage, BotApiError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push((text.to_string(), options.clone()));
            let next = self.results.lock().unwrap().pop_front().unwrap_or(Ok(()));
            next.map(|()| SentMessage {
                chat_id,
                message_id: calls.len() as i32,
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

        async fn delete_message(
            &self,
            _chat_id: i64,
            _message_id: i32,
        ) -> std::result::Result<(), BotApiError> {
            *self.deletes.lock().unwrap() += 1;
            self.results.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }

        async fn bot_user(&self) -> Option<User> {
            None
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_on_network_error() {
        let bot = ScriptedBot::with(vec![Err(BotApiError::Network("reset".into()))]);
        let sent = send_with_fallback(&bot, 1, "hi", &SendOptions::default())
            .await
            .unwrap();
        assert_eq!(sent.message_id, 2);
        assert_eq!(bot.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_after_three_attempts() {
        let bot = ScriptedBot::with(vec![
            Err(BotApiError::RetryAfter(Duration::from_secs(2))),
            Err(BotApiError::Network("a".into())),
            Err(BotApiError::Network("b".into())),
            Ok(()),
        ]);
        let err = send_with_fallback(&bot, 1, "hi", &SendOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, BotApiError::Network("b".into()));
        assert_eq!(bot.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_forbidden_exits_fast() {
        let bot = ScriptedBot::with(vec![Err(BotApiError::Forbidden("blocked".into()))]);
        let err = send_with_fallback(&bot, 1, "hi", &SendOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BotApiError::Forbidden(_)));
        assert_eq!(bot.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_reply_not_found_drops_reply_to() {
        let bot = ScriptedBot::with(vec![Err(BotApiError::ReplyNotFound(
            "Bad Request: message to be replied not found".into(),
        ))]);
        let options = SendOptions {
            reply_to: Some(10),
            ..SendOptions::default()
        };
        send_with_fallback(&bot, 1, "hi", &options).await.unwrap();
        let calls = bot.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1.reply_to, Some(10));
        assert_eq!(calls[1].1.reply_to, None);
    }

    #[tokio::test]
    async fn test_replied_bad_request_drops_reply_to() {
        let bot = ScriptedBot::with(vec![Err(BotApiError::BadRequest(
            "Bad Request: message to be replied not found".into(),
        ))]);
        let options = SendOptions {
            reply_to: Some(10),
            ..SendOptions::default()
        };
        send_with_fallback(&bot, 1, "hi", &options).await.unwrap();
        let calls = bot.calls();
        assert_eq!(calls[0].1.reply_to, Some(10));
        assert_eq!(calls[1].1.reply_to, None);
    }

    #[tokio::test]
    async fn test_parse_error_drops_parse_mode() {
        let bot = ScriptedBot::with(vec![Err(BotApiError::BadRequest(
            "Bad Request: can't parse entities".into(),
        ))]);
        let options = SendOptions::parse_mode(ParseMode::MarkdownV2);
        send_with_fallback(&bot, 1, "*x", &options).await.unwrap();
        assert_eq!(bot.calls()[1].1.parse_mode, None);
    }

    #[tokio::test]
    async fn test_parse_error_without_parse_mode_propagates() {
        let bot = ScriptedBot::with(vec![Err(BotApiError::BadRequest(
            "can't parse entities".into(),
        ))]);
        let err = send_with_fallback(&bot, 1, "x", &SendOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BotApiError::BadRequest(_)));
        assert_eq!(bot.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_send_long_keyboard_on_last_part() {
        let bot = ScriptedBot::default();
        let line = "z".repeat(100);
        let text = vec![line.as_str(); 100].join("\n");
        assert!(text.chars().count() > TEXT_LENGTH_LIMIT);
        let keyboard = InlineKeyboard::new(vec![vec![InlineButton::callback("ok", "ok:0")]]);
        let options = SendOptions::default().with_keyboard(keyboard.clone());
        let sent = send_long(&bot, 5, &text, &options).await.unwrap();
        let calls = bot.calls();
        assert_eq!(sent.len(), calls.len());
        assert!(calls.len() > 1);
        for (_, opts) in &calls[..calls.len() - 1] {
            assert!(opts.keyboard.is_none());
        }
        assert_eq!(calls.last().unwrap().1.keyboard, Some(keyboard));
    }

    #[tokio::test]
    async fn test_delete_with_retries() {
        let bot = ScriptedBot::with(vec![
            Err(BotApiError::Other("x".into())),
            Err(BotApiError::Other("y".into())),
        ]);
        assert!(!delete_with_retries(&bot, 1, 2, 2).await.unwrap());
        assert!(delete_with_retries(&bot, 1, 2, 2).await.unwrap());
        assert_eq!(*bot.deletes.lock().unwrap(), 3);
        assert!(delete_with_retries(&bot, 1, 2, 0).await.is_err());
    }
}
