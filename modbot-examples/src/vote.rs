//! `/vote a b c` posts a keyboard with one button per option; each click bumps that option's
//! count. `/vote_close` (as a reply to the vote, or on the chat's latest vote) posts the
//! result and drops the buttons' callback data.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use modbot::{BotModule, ModuleHelpers};
use modbot_callback::PersistKeyboard;
use modbot_chain::{handler_fn, HandlerEntry, HandlerResponse};
use modbot_core::{
    CheckLevel, ConditionLimit, HandlerError, Result, SendOptions, UpdateContext,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const VOTE_DOC: &str = "vote - start a vote\n/vote option1 option2 ...\nPosts one button per option and counts the clicks.";
pub const VOTE_CLOSE_DOC: &str = "vote_close - close a vote\nReply to a vote to close it; without a reply the latest vote of the chat is closed.";
pub const VOTE_PATTERN: &str = "vote";
pub const VOTE_TITLE: &str = "Vote:";
pub const VOTE_USAGE: &str = "Usage: /vote option1 option2 ...";
pub const NO_OPEN_VOTE: &str = "No open vote here.";
const BUTTONS_PER_ROW: usize = 2;

struct Poll {
    labels: Vec<String>,
    keyboard: PersistKeyboard<u32>,
}

pub struct VoteModule {
    helpers: ModuleHelpers,
    /// Open votes by `(chat_id, message_id)` of the vote message.
    polls: Mutex<HashMap<(i64, i32), Poll>>,
}

impl VoteModule {
    pub fn new(helpers: ModuleHelpers) -> Self {
        Self {
            helpers,
            polls: Mutex::new(HashMap::new()),
        }
    }

    pub async fn open_votes(&self) -> usize {
        self.polls.lock().await.len()
    }

    async fn start(&self, ctx: &UpdateContext) -> Result<HandlerResponse> {
        ctx.check(CheckLevel::Any, ConditionLimit::CHAT)?;
        if ctx.args.len() < 2 {
            ctx.error_info(VOTE_USAGE).await?;
            return Ok(HandlerResponse::Stop);
        }

        let labels = ctx.args.clone();
        let mut keyboard = PersistKeyboard::new();
        let (markup, keys) = {
            let mut store = self.helpers.callbacks().lock().await;
            let repr_labels = labels.clone();
            keyboard.setup_use_data(
                store.manager_mut(),
                vec![0u32; labels.len()],
                Some(Box::new(move |i: usize, _key: &str, count: &u32| {
                    let label = repr_labels.get(i).map(String::as_str).unwrap_or("?");
                    format!("{} ({})", label, count)
                })),
            );
            let markup = keyboard.reply_markup(store.manager(), VOTE_PATTERN, BUTTONS_PER_ROW);
            (markup, keyboard.keys().to_vec())
        };
        let markup = markup.ok_or(HandlerError::EmptyContent)?;

        let sent = ctx
            .reply_with(VOTE_TITLE, SendOptions::default().with_keyboard(markup))
            .await?;
        self.helpers.cache_cb_keys_by_message(&sent, keys).await;
        info!(chat_id = sent.chat_id, message_id = sent.message_id, options = labels.len(), "Vote started");
        self.polls
            .lock()
            .await
            .insert((sent.chat_id, sent.message_id), Poll { labels, keyboard });
        Ok(HandlerResponse::Stop)
    }

    async fn click(&self, ctx: &UpdateContext) -> Result<HandlerResponse> {
        let index = self.helpers.query_at_btn_index::<u32>(ctx).await?;
        let message_id = ctx
            .message_id
            .ok_or_else(|| HandlerError::InvalidQuery("vote click without message".to_string()))?;

        let polls = self.polls.lock().await;
        let poll = polls
            .get(&(ctx.chat_id, message_id))
            .ok_or_else(|| HandlerError::InvalidQuery(format!("vote {} is closed", message_id)))?;
        let markup = {
            let mut store = self.helpers.callbacks().lock().await;
            let manager = store.manager_mut();
            let count = poll
                .keyboard
                .get_data_by_index(manager, index)
                .map(|slot| slot.value)
                .unwrap_or_default();
            poll.keyboard
                .modify_data_by_index(manager, index, count + 1)
                .map_err(|e| HandlerError::InvalidQuery(e.to_string()))?;
            debug!(message_id, index, count = count + 1, "Vote counted");
            poll.keyboard
                .reply_markup(manager, VOTE_PATTERN, BUTTONS_PER_ROW)
        };
        drop(polls);

        ctx.bot
            .edit_text(ctx.chat_id, message_id, VOTE_TITLE, markup.as_ref())
            .await?;
        Ok(HandlerResponse::Stop)
    }

    async fn close(&self, ctx: &UpdateContext) -> Result<HandlerResponse> {
        let mut polls = self.polls.lock().await;
        let target = ctx.reply_to_message_id.or_else(|| {
            polls
                .keys()
                .filter(|(chat_id, _)| *chat_id == ctx.chat_id)
                .map(|(_, message_id)| *message_id)
                .max()
        });
        let Some((message_id, mut poll)) =
            target.and_then(|id| polls.remove(&(ctx.chat_id, id)).map(|poll| (id, poll)))
        else {
            drop(polls);
            ctx.error_info(NO_OPEN_VOTE).await?;
            return Ok(HandlerResponse::Stop);
        };
        drop(polls);

        let result = {
            let mut store = self.helpers.callbacks().lock().await;
            let mut lines = vec!["Vote closed:".to_string()];
            for (i, label) in poll.labels.iter().enumerate() {
                let count = poll
                    .keyboard
                    .get_data_by_index(store.manager(), i)
                    .map(|slot| slot.value)
                    .unwrap_or_default();
                lines.push(format!("{}: {}", label, count));
            }
            poll.keyboard.clean(store.manager_mut());
            store.clean_keys(ctx.chat_id, message_id);
            lines.join("\n")
        };
        info!(chat_id = ctx.chat_id, message_id, "Vote closed");

        ctx.bot
            .edit_text(ctx.chat_id, message_id, &result, None)
            .await?;
        Ok(HandlerResponse::Stop)
    }
}

#[async_trait]
impl BotModule for VoteModule {
    fn handlers(self: Arc<Self>) -> Vec<HandlerEntry> {
        let start = self.clone();
        let click = self.clone();
        let close = self;
        vec![
            HandlerEntry::command(
                "vote",
                Some(VOTE_DOC),
                handler_fn(move |ctx| {
                    let this = start.clone();
                    async move { this.start(&ctx).await }
                }),
            ),
            HandlerEntry::command(
                "vote_close",
                Some(VOTE_CLOSE_DOC),
                handler_fn(move |ctx| {
                    let this = close.clone();
                    async move { this.close(&ctx).await }
                }),
            ),
            HandlerEntry::callback(
                format!("{}:", VOTE_PATTERN),
                handler_fn(move |ctx| {
                    let this = click.clone();
                    async move { this.click(&ctx).await }
                }),
            ),
        ]
    }

    async fn stop(&self) -> anyhow::Result<()> {
        let mut polls = self.polls.lock().await;
        let mut store = self.helpers.callbacks().lock().await;
        for ((chat_id, message_id), mut poll) in polls.drain() {
            poll.keyboard.clean(store.manager_mut());
            store.clean_keys(chat_id, message_id);
        }
        Ok(())
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

