use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use modbot::BotModule;
use modbot_chain::{handler_fn, HandlerEntry, HandlerResponse};
use modbot_core::{HandlerError, ModbotError};

pub const TIMER_DOC: &str = "timer - reply after five seconds\nWaits five seconds, then replies to the command.";
pub const TIME_UP: &str = "time up!";
pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

/// `/timer` answers [`TIME_UP`] to the command message once `delay` has passed.
pub struct TimerModule {
    delay: Duration,
}

impl TimerModule {
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for TimerModule {
    fn default() -> Self {
        Self::with_delay(DEFAULT_DELAY)
    }
}

impl BotModule for TimerModule {
    fn handlers(self: Arc<Self>) -> Vec<HandlerEntry> {
        let delay = self.delay;
        vec![HandlerEntry::command(
            "timer",
            Some(TIMER_DOC),
            handler_fn(move |ctx| async move {
                let message_id = ctx.message_id.ok_or(HandlerError::NoText)?;
                tokio::time::sleep(delay).await;
                ctx.reply_to(message_id, TIME_UP).await?;
                Ok::<_, ModbotError>(HandlerResponse::Stop)
            }),
        )]
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
