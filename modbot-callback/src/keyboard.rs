//! Inline keyboards whose buttons stay valid across clicks.
//!
//! Each button's value is stored in the [`CallbackDataManager`] as a [`KeyboardSlot`], so the
//! handler receiving a click gets both the value and the button's position.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use modbot_core::{flatten_buttons, InlineButton, InlineKeyboard};

use crate::error::CallbackKeyError;
use crate::manager::CallbackDataManager;

/// Value stored for one button of a [`PersistKeyboard`].
#[derive(Debug, Clone, PartialEq)]
pub struct KeyboardSlot<T> {
    pub index: usize,
    pub value: T,
}

/// Renders a button's text from `(index, key, value)`.
pub type ButtonRepr<T> = Box<dyn Fn(usize, &str, &T) -> String + Send + Sync>;

pub struct PersistKeyboard<T> {
    keys: Vec<String>,
    idx_map: HashMap<String, usize>,
    repr: Option<ButtonRepr<T>>,
}

impl<T> Default for PersistKeyboard<T> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            idx_map: HashMap::new(),
            repr: None,
        }
    }
}

impl<T: Any + Send + Sync> PersistKeyboard<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores every value in `manager` and lays the keyboard out over the new keys.
    pub fn setup_use_data(
        &mut self,
        manager: &mut CallbackDataManager,
        values: impl IntoIterator<Item = T>,
        repr: Option<ButtonRepr<T>>,
    ) {
        let keys = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| manager.set(KeyboardSlot { index, value }))
            .collect();
        self.setup_use_keys(keys, repr);
    }

    /// Uses keys that already hold [`KeyboardSlot`]s.
    pub fn setup_use_keys(&mut self, keys: Vec<String>, repr: Option<ButtonRepr<T>>) {
        self.idx_map = keys
            .iter()
            .enumerate()
            .map(|(i, key)| (key.clone(), i))
            .collect();
        self.keys = keys;
        self.repr = repr;
    }

    /// `None` when the keyboard has no buttons.
    pub fn reply_markup(
        &self,
        manager: &CallbackDataManager,
        pattern: &str,
        per_row: usize,
    ) -> Option<InlineKeyboard> {
        if self.keys.is_empty() {
            return None;
        }
        let buttons = self
            .keys
            .iter()
            .enumerate()
            .map(|(i, key)| InlineButton::with_pattern(self.button_text(manager, i), pattern, key))
            .collect();
        Some(flatten_buttons(buttons, per_row))
    }

    fn button_text(&self, manager: &CallbackDataManager, index: usize) -> String {
        let key = &self.keys[index];
        let slot = manager
            .peek_as::<KeyboardSlot<T>>(key)
            .ok()
            .flatten();
        match (&self.repr, slot) {
            (Some(repr), Some(slot)) => repr(index, key, &slot.value),
            _ => index.to_string(),
        }
    }

    pub fn idx(&self, key: &str) -> Option<usize> {
        self.idx_map.get(key).copied()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn get_data_by_index(
        &self,
        manager: &CallbackDataManager,
        index: usize,
    ) -> Option<Arc<KeyboardSlot<T>>> {
        let key = self.keys.get(index)?;
        manager.peek_as::<KeyboardSlot<T>>(key).ok().flatten()
    }

    pub fn modify_data(
        &self,
        manager: &mut CallbackDataManager,
        key: &str,
        value: T,
    ) -> Result<(), CallbackKeyError> {
        let index = self
            .idx(key)
            .ok_or_else(|| CallbackKeyError::Malformed(key.to_string()))?;
        self.modify_data_by_index(manager, index, value)
    }

    pub fn modify_data_by_index(
        &self,
        manager: &mut CallbackDataManager,
        index: usize,
        value: T,
    ) -> Result<(), CallbackKeyError> {
        let key = self
            .keys
            .get(index)
            .ok_or_else(|| CallbackKeyError::Malformed(index.to_string()))?;
        manager.modify_data(key, Some(Arc::new(KeyboardSlot { index, value })))
    }

    /// Removes every button value from `manager` and empties the keyboard.
    pub fn clean(&mut self, manager: &mut CallbackDataManager) {
        for key in self.keys.drain(..) {
            let _ = manager.pop_data(&key);
        }
        self.idx_map.clear();
        self.repr = None;
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
