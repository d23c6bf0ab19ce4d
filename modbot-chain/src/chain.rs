use std::sync::Arc;

use modbot_core::{ModbotError, UpdateContext};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::handler::{HandlerResponse, Middleware};
use crate::route::{HandlerEntry, Route, RouteKind};

/// A handler or middleware failed; names where it happened.
#[derive(Error, Debug)]
#[error("{owner} failed: {source}")]
pub struct ChainError {
    /// Handler entry name or middleware type name.
    pub owner: String,
    /// Route kind of the failing handler; `None` for middleware.
    pub kind: Option<RouteKind>,
    #[source]
    pub source: ModbotError,
}

impl ChainError {
    fn handler(entry: &HandlerEntry, source: ModbotError) -> Self {
        Self {
            owner: entry.name(),
            kind: Some(entry.route.kind()),
            source,
        }
    }

    fn middleware(name: &str, source: ModbotError) -> Self {
        Self {
            owner: name.to_string(),
            kind: None,
            source,
        }
    }
}

/// Chain of middleware and routed handlers: middleware run in order (before), then the handlers
/// whose route matches; afters run in reverse order.
#[derive(Clone, Default)]
pub struct HandlerChain {
    middleware: Vec<Arc<dyn Middleware>>,
    handlers: Vec<HandlerEntry>,
}

impl HandlerChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn add_handler(mut self, entry: HandlerEntry) -> Self {
        self.handlers.push(entry);
        self
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = HandlerEntry>) {
        self.handlers.extend(entries);
    }

    pub fn handlers(&self) -> &[HandlerEntry] {
        &self.handlers
    }

    /// `(command, doc)` for every command route, in chain order. The first route wins when a
    /// command is registered twice.
    pub fn command_docs(&self) -> Vec<(String, Option<String>)> {
        let mut docs: Vec<(String, Option<String>)> = Vec::new();
        for entry in &self.handlers {
            if let Route::Command { name, doc } = &entry.route {
                if !docs.iter().any(|(command, _)| command == name) {
                    docs.push((name.clone(), doc.clone()));
                }
            }
        }
        docs
    }

    /// Runs middleware before, then matching handlers (before in order, handle until Stop or
    /// Reply, after in reverse), then middleware after in reverse. A Reply is sent to the chat.
    #[instrument(skip(self, ctx), fields(chat_id = ctx.chat_id, user_id = ?ctx.user_id))]
    pub async fn handle(&self, ctx: &UpdateContext) -> Result<HandlerResponse, ChainError> {
        for mw in &self.middleware {
            let mw_name = std::any::type_name_of_val(mw.as_ref());
            debug!(middleware = %mw_name, "step: middleware before");
            let should_continue = mw
                .before(ctx)
                .await
                .map_err(|e| ChainError::middleware(mw_name, e))?;
            if !should_continue {
                info!(middleware = %mw_name, "step: middleware before returned false, chain stopped");
                return Ok(HandlerResponse::Stop);
            }
        }

        let matching: Vec<&HandlerEntry> = self
            .handlers
            .iter()
            .filter(|entry| entry.route.matches(&ctx.update, ctx.bot_username.as_deref()))
            .collect();
        if matching.is_empty() {
            debug!("no handler matched");
        }

        for entry in &matching {
            let proceed = entry
                .handler
                .before(ctx)
                .await
                .map_err(|e| ChainError::handler(entry, e))?;
            if !proceed {
                info!(handler = %entry.name(), "step: handler before returned false, chain stopped");
                return Ok(HandlerResponse::Stop);
            }
        }

        let mut final_response = HandlerResponse::Continue;
        for entry in &matching {
            let response = entry
                .handler
                .handle(ctx)
                .await
                .map_err(|e| ChainError::handler(entry, e))?;
            debug!(handler = %entry.name(), response = ?response, "Handler processed");
            match response {
                HandlerResponse::Stop | HandlerResponse::Reply(_) => {
                    final_response = response;
                    break;
                }
                HandlerResponse::Continue | HandlerResponse::Ignore => continue,
            }
        }

        if let HandlerResponse::Reply(text) = &final_response {
            ctx.reply(text)
                .await
                .map_err(|e| ChainError::middleware("reply", e))?;
        }

        for entry in matching.iter().rev() {
            entry
                .handler
                .after(ctx, &final_response)
                .await
                .map_err(|e| ChainError::handler(entry, e))?;
        }

        for mw in self.middleware.iter().rev() {
            let mw_name = std::any::type_name_of_val(mw.as_ref());
            mw.after(ctx, &final_response)
                .await
                .map_err(|e| ChainError::middleware(mw_name, e))?;
        }

        Ok(final_response)
    }
}
