//! # modbot-chain
//!
//! Routes each update to the handlers registered for it. Middleware can stop the chain; the
//! first handler that returns Stop or Reply ends handler execution; after callbacks run in
//! reverse order.

pub mod chain;
pub mod handler;
pub mod route;

pub use chain::{ChainError, HandlerChain};
pub use handler::{handler_fn, FnHandler, Handler, HandlerResponse, Middleware};
pub use route::{HandlerEntry, MessageFilter, Route, RouteKind};
