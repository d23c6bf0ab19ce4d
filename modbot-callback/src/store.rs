//! The framework-wide callback state: the data manager plus the keys each sent message uses.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::CallbackKeyError;
use crate::keyboard::KeyboardSlot;
use crate::manager::{split_callback_data, CallbackDataManager, DataValue};

pub type SharedCallbackStore = Arc<Mutex<CallbackStore>>;

#[derive(Default)]
pub struct CallbackStore {
    manager: CallbackDataManager,
    message_keys: HashMap<(i64, i32), Vec<String>>,
}

impl CallbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedCallbackStore {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn manager(&self) -> &CallbackDataManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut CallbackDataManager {
        &mut self.manager
    }

    /// Stores each value and returns `(raw_keys, callback_data)`, the latter being
    /// `"{pattern}:{key}"` ready for buttons. Cache the raw keys with [`CallbackStore::cache_keys`]
    /// once the message is sent.
    pub fn make_btn_callback(
        &mut self,
        pattern: &str,
        values: impl IntoIterator<Item = DataValue>,
    ) -> (Vec<String>, Vec<String>) {
        values
            .into_iter()
            .map(|value| {
                let key = self.manager.set_data(Some(value));
                let data = format!("{}:{}", pattern, key);
                (key, data)
            })
            .unzip()
    }

    pub fn cache_keys(&mut self, chat_id: i64, message_id: i32, keys: Vec<String>) {
        self.message_keys.insert((chat_id, message_id), keys);
    }

    pub fn cached_keys(&self, chat_id: i64, message_id: i32) -> Option<&[String]> {
        self.message_keys
            .get(&(chat_id, message_id))
            .map(Vec::as_slice)
    }

    /// Forgets the keys cached for a message and drops their data. Returns how many were dropped.
    pub fn clean_keys(&mut self, chat_id: i64, message_id: i32) -> usize {
        let keys = self
            .message_keys
            .remove(&(chat_id, message_id))
            .unwrap_or_default();
        keys.iter()
            .filter(|key| matches!(self.manager.pop_data(*key), Ok(Some(_))))
            .count()
    }

    /// Value behind a button's callback data; popped when `pop` is set.
    pub fn data_for(
        &mut self,
        callback_data: &str,
        pop: bool,
    ) -> Result<Option<DataValue>, CallbackKeyError> {
        let (_, key) = split_callback_data(callback_data)?;
        if pop {
            self.manager.pop_data(key)
        } else {
            self.manager.peek_data(key)
        }
    }

    /// Position of the clicked button when the data is a [`KeyboardSlot<T>`].
    pub fn slot_index<T: Any + Send + Sync>(
        &self,
        callback_data: &str,
    ) -> Result<Option<usize>, CallbackKeyError> {
        let (_, key) = split_callback_data(callback_data)?;
        Ok(self
            .manager
            .peek_as::<KeyboardSlot<T>>(key)?
            .map(|slot| slot.index))
    }

    /// Drops data stored longer than `ttl` ago; returns the removed keys.
    pub fn expire_older_than(&mut self, ttl: Duration) -> Vec<u64> {
        let removed = self.manager.expire_before(Utc::now() - ttl);
        if !removed.is_empty() {
            debug!(keys = ?removed, "removed keys from callback manager");
        }
        removed
    }
}
