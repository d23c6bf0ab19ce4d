//! Adapters from Telegram (teloxide) types to modbot_core types.
//! Depends only on teloxide and modbot_core type definitions.

use modbot_core::{
    CallbackQuery, Chat, ChatKind, ForwardOrigin, Message, ToCoreMessage, ToCoreUser, User,
};
use teloxide::types::MessageOrigin;

/// Wraps a teloxide User for conversion to core [`User`].
pub struct TelegramUserWrapper<'a>(pub &'a teloxide::types::User);

impl<'a> ToCoreUser for TelegramUserWrapper<'a> {
    fn to_core(&self) -> User {
        User {
            id: self.0.id.0 as i64,
            username: self.0.username.clone(),
            first_name: Some(self.0.first_name.clone()),
            last_name: self.0.last_name.clone(),
            is_bot: self.0.is_bot,
        }
    }
}

/// Maps the teloxide chat kind onto the four kinds the framework distinguishes.
pub fn chat_kind(chat: &teloxide::types::Chat) -> ChatKind {
    if chat.is_private() {
        ChatKind::Private
    } else if chat.is_channel() {
        ChatKind::Channel
    } else if chat.is_supergroup() {
        ChatKind::Supergroup
    } else {
        ChatKind::Group
    }
}

pub fn forward_origin(origin: &MessageOrigin) -> ForwardOrigin {
    match origin {
        MessageOrigin::User { sender_user, .. } => ForwardOrigin::User(sender_user.id.0 as i64),
        MessageOrigin::HiddenUser {
            sender_user_name, ..
        } => ForwardOrigin::HiddenUser(sender_user_name.clone()),
        MessageOrigin::Chat { sender_chat, .. } => ForwardOrigin::Chat(sender_chat.id.0),
        MessageOrigin::Channel { chat, .. } => ForwardOrigin::Channel(chat.id.0),
    }
}

/// Wraps a teloxide Message for conversion to core [`Message`].
pub struct TelegramMessageWrapper<'a>(pub &'a teloxide::types::Message);

impl<'a> ToCoreMessage for TelegramMessageWrapper<'a> {
    fn to_core(&self) -> Message {
        let msg = self.0;
        Message {
            id: msg.id.0,
            chat: Chat {
                id: msg.chat.id.0,
                kind: chat_kind(&msg.chat),
            },
            from: msg.from.as_ref().map(|u| TelegramUserWrapper(u).to_core()),
            text: msg.text().map(str::to_string),
            reply_to: msg
                .reply_to_message()
                .map(|m| Box::new(TelegramMessageWrapper(m).to_core())),
            forward_origin: msg.forward_origin().map(forward_origin),
            date: msg.date,
        }
    }
}

/// Wraps a teloxide CallbackQuery for conversion to core [`CallbackQuery`].
/// The keyboard message is dropped when Telegram reports it as inaccessible.
pub struct TelegramCallbackWrapper<'a>(pub &'a teloxide::types::CallbackQuery);

impl<'a> TelegramCallbackWrapper<'a> {
    pub fn to_core(&self) -> CallbackQuery {
        let query = self.0;
        CallbackQuery {
            id: query.id.to_string(),
            from: TelegramUserWrapper(&query.from).to_core(),
            message: query
                .regular_message()
                .map(|m| TelegramMessageWrapper(m).to_core()),
            data: query.data.clone(),
        }
    }
}
