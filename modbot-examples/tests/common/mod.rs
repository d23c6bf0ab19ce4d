#![allow(dead_code)]

pub mod mock_bot;

use std::sync::Arc;

use chrono::Utc;
use modbot::{BotConfig, Framework, ModuleRegistry};
use modbot_core::{CallbackQuery, Chat, ChatKind, Message, Update, User};
use modbot_storage::DatabaseRegistry;

use mock_bot::MockBot;

pub const MASTER_ID: i64 = 1;
pub const USER_ID: i64 = 5;
pub const GROUP_ID: i64 = -300;

pub fn message(chat_id: i64, kind: ChatKind, user_id: i64, text: &str) -> Message {
    Message {
        id: 11,
        chat: Chat { id: chat_id, kind },
        from: Some(User::new(user_id)),
        text: Some(text.to_string()),
        reply_to: None,
        forward_origin: None,
        date: Utc::now(),
    }
}

pub fn private_command(user_id: i64, text: &str) -> Update {
    Update::Message(message(user_id, ChatKind::Private, user_id, text))
}

/// `text` in the group, optionally replying to message `reply_to`.
pub fn group_command(user_id: i64, text: &str, reply_to: Option<i32>) -> Update {
    let mut msg = message(GROUP_ID, ChatKind::Group, user_id, text);
    msg.reply_to = reply_to.map(|id| {
        let mut replied = message(GROUP_ID, ChatKind::Group, MASTER_ID, "Vote:");
        replied.id = id;
        Box::new(replied)
    });
    Update::Message(msg)
}

/// A click on a button of message `message_id` in chat `chat_id`.
pub fn callback(chat_id: i64, user_id: i64, message_id: i32, data: &str) -> Update {
    let kind = if chat_id == user_id {
        ChatKind::Private
    } else {
        ChatKind::Group
    };
    let mut msg = message(chat_id, kind, MASTER_ID, "Vote:");
    msg.id = message_id;
    Update::CallbackQuery(CallbackQuery {
        id: "cb".to_string(),
        from: User::new(user_id),
        message: Some(msg),
        data: Some(data.to_string()),
    })
}

/// Initialized framework over a [`MockBot`].
pub fn framework_with(registry: ModuleRegistry) -> (Framework, Arc<MockBot>) {
    let bot = MockBot::new();
    let mut framework = Framework::new(
        BotConfig::new("test_token", MASTER_ID),
        bot.clone(),
        registry,
        None,
        Arc::new(DatabaseRegistry::new()),
    );
    framework.init().expect("framework init");
    (framework, bot)
}

pub fn bundled() -> (Framework, Arc<MockBot>) {
    let mut registry = ModuleRegistry::new();
    modbot_examples::register_all(&mut registry);
    framework_with(registry)
}
