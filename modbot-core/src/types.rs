//! Core types: user, chat, message, callback query, update, inline keyboards and send options.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User identity (id, username, names).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_bot: bool,
}

impl User {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            username: None,
            first_name: None,
            last_name: None,
            is_bot: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatKind::Private => "private",
            ChatKind::Group => "group",
            ChatKind::Supergroup => "supergroup",
            ChatKind::Channel => "channel",
        }
    }
}

impl std::fmt::Display for ChatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chat (private, group or channel) identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub kind: ChatKind,
}

/// Where a forwarded message originally came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForwardOrigin {
    User(i64),
    HiddenUser(String),
    Chat(i64),
    Channel(i64),
}

/// A single message with sender, chat, text and optional reply context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i32,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    pub reply_to: Option<Box<Message>>,
    pub forward_origin: Option<ForwardOrigin>,
    pub date: DateTime<Utc>,
}

impl Message {
    /// Command parsed from the text, if the text starts with `/`.
    pub fn command(&self) -> Option<ParsedCommand<'_>> {
        self.text.as_deref().and_then(parse_command)
    }
}

/// Inline keyboard button press.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    /// The message carrying the keyboard; absent when it is too old to be delivered.
    pub message: Option<Message>,
    pub data: Option<String>,
}

/// The update kinds the framework dispatches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Update {
    Message(Message),
    ChannelPost(Message),
    CallbackQuery(CallbackQuery),
}

impl Update {
    /// The message this update is about (for callbacks, the message carrying the keyboard).
    pub fn effective_message(&self) -> Option<&Message> {
        match self {
            Update::Message(m) | Update::ChannelPost(m) => Some(m),
            Update::CallbackQuery(q) => q.message.as_ref(),
        }
    }

    pub fn effective_chat(&self) -> Option<&Chat> {
        self.effective_message().map(|m| &m.chat)
    }

    pub fn effective_user(&self) -> Option<&User> {
        match self {
            Update::Message(m) | Update::ChannelPost(m) => m.from.as_ref(),
            Update::CallbackQuery(q) => Some(&q.from),
        }
    }

    pub fn message_id(&self) -> Option<i32> {
        self.effective_message().map(|m| m.id)
    }

    pub fn reply_to_message_id(&self) -> Option<i32> {
        self.effective_message()
            .and_then(|m| m.reply_to.as_ref())
            .map(|m| m.id)
    }

    /// Text of a message update; `None` for callback queries.
    pub fn text(&self) -> Option<&str> {
        match self {
            Update::Message(m) | Update::ChannelPost(m) => m.text.as_deref(),
            Update::CallbackQuery(_) => None,
        }
    }

    pub fn callback_data(&self) -> Option<&str> {
        match self {
            Update::CallbackQuery(q) => q.data.as_deref(),
            _ => None,
        }
    }

    pub fn is_callback_query(&self) -> bool {
        matches!(self, Update::CallbackQuery(_))
    }
}

/// `/name@bot rest` split into parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    pub name: &'a str,
    pub bot_username: Option<&'a str>,
    pub rest: &'a str,
}

/// Parses `/cmd`, `/cmd@bot` and `/cmd args...`. Returns `None` if the text is not a command.
pub fn parse_command(text: &str) -> Option<ParsedCommand<'_>> {
    let text = text.trim_start();
    let body = text.strip_prefix('/')?;
    let (head, rest) = match body.find(char::is_whitespace) {
        Some(pos) => (&body[..pos], body[pos..].trim()),
        None => (body, ""),
    };
    let (name, bot_username) = match head.split_once('@') {
        Some((name, bot)) => (name, Some(bot)),
        None => (head, None),
    };
    if name.is_empty() {
        return None;
    }
    Some(ParsedCommand {
        name,
        bot_username,
        rest,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn callback(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }

    /// Button whose callback data is `{pattern}:{arg}`.
    pub fn with_pattern(text: impl Into<String>, pattern: &str, arg: impl std::fmt::Display) -> Self {
        Self::callback(text, format!("{}:{}", pattern, arg))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    pub fn new(rows: Vec<Vec<InlineButton>>) -> Self {
        Self { rows }
    }

    pub fn buttons(&self) -> impl Iterator<Item = &InlineButton> {
        self.rows.iter().flatten()
    }
}

/// Lays out `buttons` in rows of at most `per_row`; the last row may be shorter.
pub fn flatten_buttons(buttons: Vec<InlineButton>, per_row: usize) -> InlineKeyboard {
    let per_row = per_row.max(1);
    let mut rows = Vec::with_capacity(buttons.len().div_ceil(per_row));
    let mut iter = buttons.into_iter().peekable();
    while iter.peek().is_some() {
        rows.push(iter.by_ref().take(per_row).collect());
    }
    InlineKeyboard { rows }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    Markdown,
    MarkdownV2,
    Html,
}

/// Optional parts of an outgoing text message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOptions {
    pub reply_to: Option<i32>,
    pub parse_mode: Option<ParseMode>,
    pub keyboard: Option<InlineKeyboard>,
}

impl SendOptions {
    pub fn parse_mode(mode: ParseMode) -> Self {
        Self {
            parse_mode: Some(mode),
            ..Self::default()
        }
    }

    pub fn with_keyboard(mut self, keyboard: InlineKeyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Converts a transport message into a core [`Message`].
pub trait ToCoreMessage: Send + Sync {
    fn to_core(&self) -> Message;
}

/// Converts a transport user into a core [`User`].
pub trait ToCoreUser: Send + Sync {
    fn to_core(&self) -> User;
}

/// Identifies a message the bot sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SentMessage {
    pub chat_id: i64,
    pub message_id: i32,
}
