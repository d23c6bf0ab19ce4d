#![allow(dead_code)]

pub mod mock_bot;

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use modbot::{BotConfig, BotModule, Framework, FrameworkHandle, ModuleRegistry};
use modbot_callback::CallbackStore;
use modbot_chain::HandlerEntry;
use modbot_core::{CallbackQuery, Chat, ChatKind, ForwardOrigin, LangRegistry, Message, Update, User};
use modbot_storage::DatabaseRegistry;

use mock_bot::MockBot;

pub const MASTER_ID: i64 = 1;
pub const USER_ID: i64 = 5;
pub const GROUP_ID: i64 = -200;

pub fn message(chat_id: i64, kind: ChatKind, user_id: i64, text: &str) -> Message {
    Message {
        id: 11,
        chat: Chat { id: chat_id, kind },
        from: Some(User {
            id: user_id,
            username: Some("test_user".to_string()),
            first_name: Some("Test".to_string()),
            last_name: None,
            is_bot: false,
        }),
        text: Some(text.to_string()),
        reply_to: None,
        forward_origin: None,
        date: Utc::now(),
    }
}

pub fn private_command(user_id: i64, text: &str) -> Update {
    Update::Message(message(user_id, ChatKind::Private, user_id, text))
}

pub fn group_command(user_id: i64, text: &str) -> Update {
    Update::Message(message(GROUP_ID, ChatKind::Group, user_id, text))
}

/// `text` sent in the group as a reply to `replied`.
pub fn group_reply(user_id: i64, text: &str, replied: Message) -> Update {
    let mut msg = message(GROUP_ID, ChatKind::Group, user_id, text);
    msg.reply_to = Some(Box::new(replied));
    Update::Message(msg)
}

pub fn forwarded(origin: ForwardOrigin) -> Message {
    let mut msg = message(GROUP_ID, ChatKind::Group, 77, "forwarded");
    msg.id = 9;
    msg.forward_origin = Some(origin);
    msg
}

/// A click on a button of message `message_id` in a private chat.
pub fn callback(user_id: i64, message_id: i32, data: &str) -> Update {
    let mut msg = message(user_id, ChatKind::Private, user_id, "menu");
    msg.id = message_id;
    Update::CallbackQuery(CallbackQuery {
        id: "cb".to_string(),
        from: User::new(user_id),
        message: Some(msg),
        data: Some(data.to_string()),
    })
}

/// Counts its lifecycle hooks; contributes the handlers it was given.
#[derive(Default)]
pub struct TestModule {
    pub priority: i32,
    pub tag: &'static str,
    pub handlers: Vec<HandlerEntry>,
    pub post_inits: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
    pub daily_jobs: Arc<AtomicUsize>,
}

impl TestModule {
    pub fn with_priority(priority: i32) -> Self {
        Self {
            priority,
            ..Self::default()
        }
    }

    pub fn count(counter: &Arc<AtomicUsize>) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BotModule for TestModule {
    fn priority(&self) -> i32 {
        self.priority
    }

    fn handlers(self: Arc<Self>) -> Vec<HandlerEntry> {
        self.handlers.clone()
    }

    async fn post_init(&self, _fw: &FrameworkHandle) -> anyhow::Result<()> {
        self.post_inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn daily_job(&self, _fw: &FrameworkHandle) -> anyhow::Result<()> {
        self.daily_jobs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A module type distinct from [`TestModule`], for lookups by type.
pub struct OtherModule;

impl BotModule for OtherModule {
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

pub fn test_config() -> BotConfig {
    BotConfig::new("test_token", MASTER_ID)
}

pub fn module_env(config: BotConfig) -> modbot::ModuleEnv {
    modbot::ModuleEnv::new(
        Arc::new(config),
        Arc::new(DatabaseRegistry::new()),
        CallbackStore::shared(),
        Arc::new(LangRegistry::new("en")),
    )
}

/// Initialized framework over a [`MockBot`].
pub fn framework_with(config: BotConfig, registry: ModuleRegistry) -> (Framework, Arc<MockBot>) {
    let bot = MockBot::new();
    let mut framework = Framework::new(
        config,
        bot.clone(),
        registry,
        None,
        Arc::new(DatabaseRegistry::new()),
    );
    framework.init().expect("framework init");
    (framework, bot)
}
