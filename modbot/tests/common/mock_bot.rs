//! Mock implementation of [`modbot_core::Bot`] for framework tests.
//!
//! Records sent, edited and deleted messages so tests can assert on them without hitting Telegram.

use async_trait::async_trait;
use modbot_core::{BotApiError, InlineKeyboard, SendOptions, SentMessage};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

/// One recorded `send_text(chat_id, text)` call.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct SendRecord {
    pub chat_id: i64,
    pub text: String,
    pub options: SendOptions,
}

/// One recorded `edit_text` call.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct EditRecord {
    pub chat_id: i64,
    pub message_id: i32,
    pub text: String,
    pub keyboard: Option<InlineKeyboard>,
}

#[derive(Default)]
pub struct MockBot {
    next_id: AtomicI32,
    sent: Mutex<Vec<SendRecord>>,
    edits: Mutex<Vec<EditRecord>>,
    deletes: Mutex<Vec<(i64, i32)>>,
}

#[allow(dead_code)]
impl MockBot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicI32::new(1000),
            ..Self::default()
        })
    }

    pub fn sent(&self) -> Vec<SendRecord> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts sent to `chat_id`, in order.
    pub fn texts_to(&self, chat_id: i64) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|r| r.chat_id == chat_id)
            .map(|r| r.text)
            .collect()
    }

    pub fn edits(&self) -> Vec<EditRecord> {
        self.edits.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<(i64, i32)> {
        self.deletes.lock().unwrap().clone()
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
        self.sent.lock().unwrap().push(SendRecord {
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
        chat_id: i64,
        message_id: i32,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), BotApiError> {
        self.edits.lock().unwrap().push(EditRecord {
            chat_id,
            message_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), BotApiError> {
        self.deletes.lock().unwrap().push((chat_id, message_id));
        Ok(())
    }
}
