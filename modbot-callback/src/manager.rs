//! Maps short numeric keys to values referenced by inline keyboard buttons.
//!
//! Telegram limits callback data to 64 bytes, so buttons carry `"{pattern}:{key}"` and the real
//! value stays here until it is popped or expires.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::CallbackKeyError;
use crate::history::CallbackHistory;

/// A stored callback value.
pub type DataValue = Arc<dyn Any + Send + Sync>;

/// Anything usable as a manager key: the decimal string handed out by
/// [`CallbackDataManager::set_data`], or the number itself.
pub trait CallbackKey {
    fn to_key(&self) -> Result<u64, CallbackKeyError>;
}

impl CallbackKey for u64 {
    fn to_key(&self) -> Result<u64, CallbackKeyError> {
        Ok(*self)
    }
}

impl CallbackKey for &str {
    fn to_key(&self) -> Result<u64, CallbackKeyError> {
        self.trim()
            .parse()
            .map_err(|_| CallbackKeyError::Malformed(self.to_string()))
    }
}

impl CallbackKey for String {
    fn to_key(&self) -> Result<u64, CallbackKeyError> {
        self.as_str().to_key()
    }
}

impl CallbackKey for &String {
    fn to_key(&self) -> Result<u64, CallbackKeyError> {
        self.as_str().to_key()
    }
}

#[derive(Default)]
pub struct CallbackDataManager {
    next_id: u64,
    data: HashMap<u64, DataValue>,
    history: CallbackHistory,
}

impl CallbackDataManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` and returns its key. The key counter advances even for `None`, which
    /// stores nothing.
    pub fn set_data(&mut self, value: Option<DataValue>) -> String {
        let id = self.next_id;
        if let Some(value) = value {
            self.data.insert(id, value);
            self.history.enqueue(id);
        }
        self.next_id += 1;
        id.to_string()
    }

    pub fn set<T: Any + Send + Sync>(&mut self, value: T) -> String {
        self.set_data(Some(Arc::new(value)))
    }

    pub fn pop_data(&mut self, key: impl CallbackKey) -> Result<Option<DataValue>, CallbackKeyError> {
        Ok(self.data.remove(&key.to_key()?))
    }

    pub fn peek_data(&self, key: impl CallbackKey) -> Result<Option<DataValue>, CallbackKeyError> {
        Ok(self.data.get(&key.to_key()?).cloned())
    }

    /// Replaces the value under `key`; `None` removes it.
    pub fn modify_data(
        &mut self,
        key: impl CallbackKey,
        value: Option<DataValue>,
    ) -> Result<(), CallbackKeyError> {
        let key = key.to_key()?;
        match value {
            Some(value) => {
                self.data.insert(key, value);
            }
            None => {
                self.data.remove(&key);
            }
        }
        Ok(())
    }

    /// Typed peek. `None` when the key is absent or holds another type.
    pub fn peek_as<T: Any + Send + Sync>(
        &self,
        key: impl CallbackKey,
    ) -> Result<Option<Arc<T>>, CallbackKeyError> {
        Ok(self.peek_data(key)?.and_then(|v| v.downcast::<T>().ok()))
    }

    /// Typed pop. A value of another type is left in place.
    pub fn pop_as<T: Any + Send + Sync>(
        &mut self,
        key: impl CallbackKey,
    ) -> Result<Option<Arc<T>>, CallbackKeyError> {
        let key = key.to_key()?;
        let matches = self.data.get(&key).is_some_and(|v| v.is::<T>());
        if !matches {
            return Ok(None);
        }
        Ok(self.data.remove(&key).and_then(|v| v.downcast::<T>().ok()))
    }

    /// Drops every value stored before `cutoff` and returns the expired keys.
    /// Keys already popped are skipped.
    pub fn expire_before(&mut self, cutoff: DateTime<Utc>) -> Vec<u64> {
        self.history
            .pop_before(cutoff)
            .into_iter()
            .filter(|key| self.data.remove(key).is_some())
            .collect()
    }

    pub fn history_mut(&mut self) -> &mut CallbackHistory {
        &mut self.history
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Splits `"{pattern}:{key}"` at the first `:`.
pub fn split_callback_data(data: &str) -> Result<(&str, &str), CallbackKeyError> {
    data.split_once(':')
        .ok_or_else(|| CallbackKeyError::MissingSeparator(data.to_string()))
}
