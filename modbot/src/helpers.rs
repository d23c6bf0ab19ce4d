//! Callback-button helpers shared by modules.

use std::any::Any;
use std::sync::Arc;

use modbot_callback::{CallbackKeyError, DataValue, SharedCallbackStore};
use modbot_chain::{handler_fn, Handler, HandlerResponse};
use modbot_core::{
    BasicLanguage, HandlerError, InlineKeyboard, ModbotError, Result, SentMessage, UpdateContext,
};
use tracing::debug;

fn invalid_query(e: CallbackKeyError) -> ModbotError {
    HandlerError::InvalidQuery(e.to_string()).into()
}

/// Wraps the shared [`modbot_callback::CallbackStore`] with the operations a button handler needs.
#[derive(Clone)]
pub struct ModuleHelpers {
    callbacks: SharedCallbackStore,
}

impl ModuleHelpers {
    pub fn new(callbacks: SharedCallbackStore) -> Self {
        Self { callbacks }
    }

    pub fn callbacks(&self) -> &SharedCallbackStore {
        &self.callbacks
    }

    /// Stores `values` and returns `(raw_keys, callback_data)`. Cache the raw keys once the
    /// message carrying the buttons is sent.
    pub async fn make_btn_callback(
        &self,
        pattern: &str,
        values: impl IntoIterator<Item = DataValue>,
    ) -> (Vec<String>, Vec<String>) {
        self.callbacks.lock().await.make_btn_callback(pattern, values)
    }

    pub async fn cache_cb_keys_by_id(&self, chat_id: i64, message_id: i32, keys: Vec<String>) {
        self.callbacks
            .lock()
            .await
            .cache_keys(chat_id, message_id, keys);
    }

    pub async fn cache_cb_keys_by_message(&self, message: &SentMessage, keys: Vec<String>) {
        self.cache_cb_keys_by_id(message.chat_id, message.message_id, keys)
            .await;
    }

    /// Drops the data behind every button of the message the update is about.
    pub async fn clean_cb_keys(&self, ctx: &UpdateContext) -> usize {
        let Some(message_id) = ctx.message_id else {
            return 0;
        };
        let removed = self
            .callbacks
            .lock()
            .await
            .clean_keys(ctx.chat_id, message_id);
        debug!(chat_id = ctx.chat_id, message_id, removed, "Cleaned callback keys");
        removed
    }

    /// Data behind the clicked button. With `check_valid`, missing data is an
    /// [`HandlerError::InvalidQuery`]; the framework then marks the button invalid.
    pub async fn btn_callback_data(
        &self,
        ctx: &UpdateContext,
        pop: bool,
        check_valid: bool,
    ) -> Result<Option<DataValue>> {
        let data = callback_data(ctx)?;
        let value = self
            .callbacks
            .lock()
            .await
            .data_for(data, pop)
            .map_err(invalid_query)?;
        if value.is_none() && check_valid {
            return Err(HandlerError::InvalidQuery(format!("no data for {}", data)).into());
        }
        Ok(value)
    }

    /// Typed [`ModuleHelpers::btn_callback_data`]; missing data or another type is invalid.
    pub async fn btn_callback_data_as<T: Any + Send + Sync>(
        &self,
        ctx: &UpdateContext,
        pop: bool,
    ) -> Result<Arc<T>> {
        let value = self
            .btn_callback_data(ctx, pop, true)
            .await?
            .ok_or_else(|| HandlerError::InvalidQuery("no data".to_string()))?;
        value.downcast::<T>().map_err(|_| {
            HandlerError::InvalidQuery(format!(
                "callback data is not a {}",
                std::any::type_name::<T>()
            ))
            .into()
        })
    }

    /// Ends a button message: cleans its keys, then deletes it or replaces its text and keyboard.
    pub async fn query_remove_btn(
        &self,
        ctx: &UpdateContext,
        text: &str,
        remove_message: bool,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        let message_id = ctx
            .message_id
            .ok_or_else(|| HandlerError::InvalidQuery("callback query has no message".to_string()))?;
        self.clean_cb_keys(ctx).await;
        if remove_message {
            ctx.bot.delete_message(ctx.chat_id, message_id).await?;
        } else {
            ctx.bot
                .edit_text(ctx.chat_id, message_id, text, keyboard)
                .await?;
        }
        Ok(())
    }

    /// Position of the clicked button of a [`modbot_callback::PersistKeyboard<T>`].
    pub async fn query_at_btn_index<T: Any + Send + Sync>(&self, ctx: &UpdateContext) -> Result<usize> {
        let data = callback_data(ctx)?;
        self.callbacks
            .lock()
            .await
            .slot_index::<T>(data)
            .map_err(invalid_query)?
            .ok_or_else(|| HandlerError::InvalidQuery(format!("no keyboard slot for {}", data)).into())
    }

    /// Handler for `/cancel`.
    pub fn cancel_handler() -> Arc<dyn Handler> {
        handler_fn(|ctx| async move {
            ctx.reply(ctx.t(&BasicLanguage::CANCELLED)).await?;
            Ok::<_, ModbotError>(HandlerResponse::Stop)
        })
    }
}

fn callback_data(ctx: &UpdateContext) -> Result<&str> {
    ctx.update
        .callback_data()
        .ok_or_else(|| HandlerError::InvalidQuery("update has no callback data".to_string()).into())
}
