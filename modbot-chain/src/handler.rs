use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use modbot_core::{Result, UpdateContext};

/// Outcome of a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResponse {
    /// Let the next handler run.
    Continue,
    /// End the handler phase.
    Stop,
    /// Not interested; same as Continue for the chain.
    Ignore,
    /// End the handler phase; the chain sends the text back to the chat.
    Reply(String),
}

#[async_trait]
pub trait Handler: Send + Sync {
    /// Runs before the handle phase. Return false to stop the chain.
    async fn before(&self, _ctx: &UpdateContext) -> Result<bool> {
        Ok(true)
    }

    /// Processes the update. Return Stop or Reply to end the handle phase. Default: Continue.
    async fn handle(&self, _ctx: &UpdateContext) -> Result<HandlerResponse> {
        Ok(HandlerResponse::Continue)
    }

    /// Runs after the handle phase (reverse order), with the final response.
    async fn after(&self, _ctx: &UpdateContext, _response: &HandlerResponse) -> Result<()> {
        Ok(())
    }
}

/// Runs around every handler: `before` in registration order, `after` in reverse.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn before(&self, _ctx: &UpdateContext) -> Result<bool> {
        Ok(true)
    }

    async fn after(&self, _ctx: &UpdateContext, _response: &HandlerResponse) -> Result<()> {
        Ok(())
    }
}

/// Handler backed by an async closure. The closure gets its own copy of the context.
pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(UpdateContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HandlerResponse>> + Send,
{
    async fn handle(&self, ctx: &UpdateContext) -> Result<HandlerResponse> {
        (self.f)(ctx.clone()).await
    }
}

pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn Handler>
where
    F: Fn(UpdateContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HandlerResponse>> + Send + 'static,
{
    Arc::new(FnHandler { f })
}
