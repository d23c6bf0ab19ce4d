use std::any::Any;
use std::sync::Arc;

use modbot::BotModule;
use modbot_chain::{handler_fn, HandlerEntry, HandlerResponse};
use modbot_core::{ModbotError, UpdateContext};
use tracing::info;

pub const ECHO_DOC: &str = "echo - repeat the text\nReplies with the text after /echo.";

/// `/echo text` replies `text`; a bare `/echo` is swallowed.
pub struct EchoModule;

impl EchoModule {
    async fn echo(ctx: UpdateContext) -> Result<HandlerResponse, ModbotError> {
        let text = ctx.message_after_command().map(str::trim).unwrap_or_default();
        if !text.is_empty() {
            info!(chat_id = ctx.chat_id, user_id = ?ctx.user_id, "Echoing message");
            ctx.reply(text).await?;
        }
        Ok(HandlerResponse::Stop)
    }
}

impl BotModule for EchoModule {
    fn handlers(self: Arc<Self>) -> Vec<HandlerEntry> {
        vec![HandlerEntry::command(
            "echo",
            Some(ECHO_DOC),
            handler_fn(Self::echo),
        )]
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
