//! Which updates a handler receives.

use std::fmt;
use std::sync::Arc;

use modbot_core::{parse_command, ChatKind, Update};

use crate::handler::Handler;

/// Predicate over non-command messages.
#[derive(Clone)]
pub enum MessageFilter {
    /// Any text message that is not a command.
    Text,
    /// Text messages in private chats.
    PrivateText,
    /// Any message outside channels.
    NotChannel,
    Custom(Arc<dyn Fn(&Update) -> bool + Send + Sync>),
}

impl MessageFilter {
    pub fn custom(f: impl Fn(&Update) -> bool + Send + Sync + 'static) -> Self {
        MessageFilter::Custom(Arc::new(f))
    }

    fn accepts(&self, update: &Update) -> bool {
        let kind = update.effective_chat().map(|c| c.kind);
        match self {
            MessageFilter::Text => update.text().is_some(),
            MessageFilter::PrivateText => {
                update.text().is_some() && kind == Some(ChatKind::Private)
            }
            MessageFilter::NotChannel => kind != Some(ChatKind::Channel),
            MessageFilter::Custom(f) => f(update),
        }
    }
}

impl fmt::Debug for MessageFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageFilter::Text => f.write_str("Text"),
            MessageFilter::PrivateText => f.write_str("PrivateText"),
            MessageFilter::NotChannel => f.write_str("NotChannel"),
            MessageFilter::Custom(_) => f.write_str("Custom"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Command,
    Callback,
    Message,
}

#[derive(Debug, Clone)]
pub enum Route {
    /// `/name` or `/name@bot`. `doc` is the help text; its first line reads `name - summary`.
    Command { name: String, doc: Option<String> },
    /// Callback queries whose data starts with `prefix`.
    Callback { prefix: String },
    /// Messages that are not commands and pass the filter.
    Message(MessageFilter),
}

impl Route {
    pub fn kind(&self) -> RouteKind {
        match self {
            Route::Command { .. } => RouteKind::Command,
            Route::Callback { .. } => RouteKind::Callback,
            Route::Message(_) => RouteKind::Message,
        }
    }

    /// Whether `update` goes to this route. `bot_username` rejects commands addressed to
    /// another bot.
    pub fn matches(&self, update: &Update, bot_username: Option<&str>) -> bool {
        match self {
            Route::Command { name, .. } => {
                let Some(cmd) = update.text().and_then(parse_command) else {
                    return false;
                };
                let addressed_here = match (cmd.bot_username, bot_username) {
                    (Some(target), Some(ours)) => target.eq_ignore_ascii_case(ours),
                    _ => true,
                };
                addressed_here && cmd.name.eq_ignore_ascii_case(name)
            }
            Route::Callback { prefix } => update
                .callback_data()
                .is_some_and(|data| data.starts_with(prefix.as_str())),
            Route::Message(filter) => {
                !update.is_callback_query()
                    && update.text().and_then(parse_command).is_none()
                    && filter.accepts(update)
            }
        }
    }
}

/// A handler with its route and the module that registered it.
#[derive(Clone)]
pub struct HandlerEntry {
    pub route: Route,
    pub handler: Arc<dyn Handler>,
    pub owner: String,
}

impl HandlerEntry {
    pub fn new(route: Route, handler: Arc<dyn Handler>) -> Self {
        Self {
            route,
            handler,
            owner: String::new(),
        }
    }

    pub fn command(name: impl Into<String>, doc: Option<&str>, handler: Arc<dyn Handler>) -> Self {
        Self::new(
            Route::Command {
                name: name.into(),
                doc: doc.map(str::to_string),
            },
            handler,
        )
    }

    pub fn callback(prefix: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        Self::new(
            Route::Callback {
                prefix: prefix.into(),
            },
            handler,
        )
    }

    pub fn message(filter: MessageFilter, handler: Arc<dyn Handler>) -> Self {
        Self::new(Route::Message(filter), handler)
    }

    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn name(&self) -> String {
        match &self.route {
            Route::Command { name, .. } => format!("{}:/{}", self.owner, name),
            Route::Callback { prefix } => format!("{}:cb:{}", self.owner, prefix),
            Route::Message(filter) => format!("{}:msg:{:?}", self.owner, filter),
        }
    }
}
