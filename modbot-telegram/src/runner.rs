//! Dispatcher runner: converts teloxide updates to core updates and hands them to an [`UpdateSink`].
//! Calls get_me first to populate the bot username; shuts down on the stop notification or Ctrl-C.

use anyhow::Result;
use async_trait::async_trait;
use modbot_core::{ToCoreMessage, Update as CoreUpdate};
use std::sync::Arc;
use std::time::Duration;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::RequestError;
use tokio::sync::{Notify, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::adapters::{TelegramCallbackWrapper, TelegramMessageWrapper};

/// Receives every converted update. Implemented by the framework.
#[async_trait]
pub trait UpdateSink: Send + Sync {
    async fn on_update(&self, update: CoreUpdate);
}

/// Polls Telegram until `stop` is notified or Ctrl-C is pressed.
///
/// Before dispatching, get_me() is called and the username written into `bot_username`.
/// Each update is spawned into its own task so a slow handler never blocks polling.
#[instrument(skip(bot, sink, bot_username, stop))]
pub async fn run_dispatcher(
    bot: teloxide::Bot,
    sink: Arc<dyn UpdateSink>,
    bot_username: Arc<RwLock<Option<String>>>,
    stop: Arc<Notify>,
) -> Result<()> {
    match bot.get_me().await {
        Ok(me) => {
            if let Some(username) = &me.user.username {
                *bot_username.write().await = Some(username.clone());
                info!(username = %username, "Bot username set before dispatch");
            }
        }
        Err(e) => warn!(error = %e, "get_me failed, commands addressed to @bot will not match"),
    }

    let mut dispatcher = Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![sink])
        .default_handler(|upd| async move {
            debug!(update_id = ?upd.id, "Unhandled update kind");
        })
        .enable_ctrlc_handler()
        .build();

    let token = dispatcher.shutdown_token();
    let watcher = tokio::spawn(async move {
        stop.notified().await;
        info!("Stop requested, shutting down dispatcher");
        // Shutdown is refused while the dispatcher is still starting up.
        loop {
            match token.shutdown() {
                Ok(done) => {
                    done.await;
                    break;
                }
                Err(_) => tokio::time::sleep(Duration::from_millis(100)).await,
            }
        }
    });

    info!("Dispatcher started");
    dispatcher.dispatch().await;
    watcher.abort();
    info!("Dispatcher stopped");
    Ok(())
}

fn schema() -> UpdateHandler<RequestError> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_channel_post().endpoint(on_channel_post))
        .branch(Update::filter_callback_query().endpoint(on_callback_query))
}

fn spawn_update(sink: Arc<dyn UpdateSink>, update: CoreUpdate) {
    tokio::spawn(async move {
        sink.on_update(update).await;
    });
}

async fn on_message(msg: Message, sink: Arc<dyn UpdateSink>) -> Result<(), RequestError> {
    let core_msg = TelegramMessageWrapper(&msg).to_core();
    info!(
        user_id = ?core_msg.from.as_ref().map(|u| u.id),
        chat_id = core_msg.chat.id,
        message_id = core_msg.id,
        has_text = core_msg.text.is_some(),
        "Received message"
    );
    spawn_update(sink, CoreUpdate::Message(core_msg));
    respond(())
}

async fn on_channel_post(msg: Message, sink: Arc<dyn UpdateSink>) -> Result<(), RequestError> {
    let core_msg = TelegramMessageWrapper(&msg).to_core();
    debug!(chat_id = core_msg.chat.id, message_id = core_msg.id, "Received channel post");
    spawn_update(sink, CoreUpdate::ChannelPost(core_msg));
    respond(())
}

async fn on_callback_query(
    bot: Bot,
    q: CallbackQuery,
    sink: Arc<dyn UpdateSink>,
) -> Result<(), RequestError> {
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        warn!(error = %e, "Failed to answer callback query");
    }
    let query = TelegramCallbackWrapper(&q).to_core();
    info!(
        user_id = query.from.id,
        data = ?query.data,
        "Received callback query"
    );
    spawn_update(sink, CoreUpdate::CallbackQuery(query));
    respond(())
}
