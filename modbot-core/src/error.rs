use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModbotError {
    #[error("Bot error: {0}")]
    Bot(#[from] BotApiError),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    #[error("Permission error: {0}")]
    Permission(#[from] PermissionError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ModbotError {
    /// Transport hiccups that are not worth reporting to the operator.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ModbotError::Bot(BotApiError::Network(_)) | ModbotError::Bot(BotApiError::RetryAfter(_))
        )
    }
}

/// Failures reported by the Bot API transport, classified by how callers react to them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BotApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The message given as reply target no longer exists.
    #[error("Reply target not found: {0}")]
    ReplyNotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Chat migrated to {0}")]
    ChatMigrated(i64),

    #[error("Flood control exceeded, retry after {0:?}")]
    RetryAfter(Duration),

    #[error("Network error: {0}")]
    Network(String),

    #[error("{0}")]
    Other(String),
}

impl BotApiError {
    /// Errors that will not go away by sending the same request again.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BotApiError::BadRequest(_)
                | BotApiError::ReplyNotFound(_)
                | BotApiError::Forbidden(_)
                | BotApiError::InvalidToken
                | BotApiError::ChatMigrated(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("No text in message")]
    NoText,

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("State error: {0}")]
    State(String),

    #[error("Empty content")]
    EmptyContent,
}

/// Outcome of a failed permission check; see [`crate::permission::permission_check`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionError {
    #[error("user has no permission")]
    InvalidUser,

    #[error("invalid chat type")]
    InvalidChatType,

    #[error("channel update ignored")]
    IgnoreChannel,
}

pub type Result<T> = std::result::Result<T, ModbotError>;
