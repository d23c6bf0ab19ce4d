//! Mock implementation of [`modbot_core::Bot`] for integration tests.
//!
//! Records every sent text so tests can assert on replies without hitting Telegram.

use async_trait::async_trait;
use modbot_core::{BotApiError, InlineKeyboard, SendOptions, SentMessage};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One recorded `send_text(chat_id, text)` call.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct SendRecord {
    pub chat_id: i64,
    pub text: String,
    pub options: SendOptions,
}

pub struct MockBot {
    next_id: AtomicI32,
    send_tx: mpsc::UnboundedSender<SendRecord>,
}

impl MockBot {
    /// Creates a MockBot and returns the receiver for send records.
    pub fn with_receiver() -> (Arc<Self>, mpsc::UnboundedReceiver<SendRecord>) {
        let (send_tx, send_rx) = mpsc::unbounded_channel();
        let bot = Arc::new(Self {
            next_id: AtomicI32::new(1000),
            send_tx,
        });
        (bot, send_rx)
    }
}

#[async_trait]
impl modbot_core::Bot for MockBot {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        options: &SendOptions,
    ) -> Result<SentMessage, BotApiError> {
        let _ = self.send_tx.send(SendRecord {
            chat_id,
            text: text.to_string(),
            options: options.clone(),
        });
        Ok(SentMessage {
            chat_id,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst),
        })
    }

    async fn edit_text(
        &self,
        _chat_id: i64,
        _message_id: i32,
        _text: &str,
        _keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), BotApiError> {
        Ok(())
    }

    async fn delete_message(&self, _chat_id: i64, _message_id: i32) -> Result<(), BotApiError> {
        Ok(())
    }
}
