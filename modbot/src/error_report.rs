//! What happens to an error a handler returns.

use std::error::Error as _;

use modbot_callback::SharedCallbackStore;
use modbot_chain::{ChainError, RouteKind};
use modbot_core::{
    format_text, send_long, BasicLanguage, HandlerError, ModbotError, PermissionError,
    SendOptions, UpdateContext,
};
use tracing::{debug, error, warn};

/// Answers permission errors, marks dead buttons and forwards everything else to the master.
pub async fn report_error(ctx: &UpdateContext, callbacks: &SharedCallbackStore, err: ChainError) {
    match &err.source {
        ModbotError::Permission(permission) => {
            if err.kind == Some(RouteKind::Command) && !ctx.is_channel_message() {
                answer_permission(ctx, *permission).await;
            } else {
                debug!(
                    owner = %err.owner,
                    kind = ?err.kind,
                    error = %permission,
                    "Permission denied, not answered"
                );
            }
        }
        ModbotError::Handler(HandlerError::InvalidQuery(reason)) => {
            warn!(owner = %err.owner, reason = %reason, "Invalid callback query");
            mark_invalid_button(ctx, callbacks).await;
        }
        source if source.is_transient() => {
            warn!(owner = %err.owner, error = %source, "Transient error ignored");
        }
        source => {
            let mut chain = String::new();
            let mut cause = source.source();
            while let Some(inner) = cause {
                chain.push_str(&format!(" <- {}", inner));
                cause = inner.source();
            }
            error!(owner = %err.owner, error = %source, causes = %chain, "Handler failed");
            let text = format!(
                "{}\n{}: {}",
                ctx.lang.t(&BasicLanguage::UNKNOWN_ERROR, Some(ctx.master_id)),
                err.owner,
                source
            );
            if let Err(e) = send_long(
                ctx.bot.as_ref(),
                ctx.master_id,
                &text,
                &SendOptions::default(),
            )
            .await
            {
                error!(error = %e, "Failed to report error to master");
            }
        }
    }
}

async fn answer_permission(ctx: &UpdateContext, permission: PermissionError) {
    let text = match permission {
        PermissionError::InvalidUser => ctx.t(&BasicLanguage::NO_PERMISSION).to_string(),
        PermissionError::InvalidChatType => format_text(
            ctx.t(&BasicLanguage::INVALID_CHAT_TYPE),
            &[&ctx.chat_type_str()],
        ),
        PermissionError::IgnoreChannel => return,
    };
    if let Err(e) = ctx.reply(&text).await {
        warn!(error = %e, chat_id = ctx.chat_id, "Failed to answer permission error");
    }
}

/// Replaces a button message whose data is gone with `INVALID_BUTTON`.
async fn mark_invalid_button(ctx: &UpdateContext, callbacks: &SharedCallbackStore) {
    let (Some(data), Some(message_id)) = (ctx.update.callback_data(), ctx.message_id) else {
        return;
    };
    let mut store = callbacks.lock().await;
    if matches!(store.data_for(data, false), Ok(Some(_))) {
        return;
    }
    store.clean_keys(ctx.chat_id, message_id);
    drop(store);
    if let Err(e) = ctx
        .bot
        .edit_text(ctx.chat_id, message_id, ctx.t(&BasicLanguage::INVALID_BUTTON), None)
        .await
    {
        warn!(error = %e, chat_id = ctx.chat_id, message_id, "Failed to mark button invalid");
    }
}
