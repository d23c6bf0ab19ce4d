pub mod mock_bot;

use std::sync::Arc;

use chrono::Utc;
use modbot_core::{Chat, ChatKind, LangRegistry, Message, Update, UpdateContext, User};

pub fn create_test_update(chat_kind: ChatKind, text: &str) -> Update {
    Update::Message(Message {
        id: 11,
        chat: Chat {
            id: 456,
            kind: chat_kind,
        },
        from: Some(User {
            id: 123,
            username: Some("test_user".to_string()),
            first_name: Some("Test".to_string()),
            last_name: None,
            is_bot: false,
        }),
        text: Some(text.to_string()),
        reply_to: None,
        forward_origin: None,
        date: Utc::now(),
    })
}

pub fn create_test_context(text: &str, bot: Arc<mock_bot::MockBot>) -> UpdateContext {
    UpdateContext::new(
        create_test_update(ChatKind::Private, text),
        bot,
        Arc::new(LangRegistry::new("en")),
        1,
        Some("test_bot".to_string()),
    )
}
