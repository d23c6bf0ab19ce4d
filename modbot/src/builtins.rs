//! Commands every bot has: `/stop`, `/restart`, `/debug_mode`, `/get_id`, `/help` and `/cancel`.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use modbot_chain::{Handler, HandlerEntry, HandlerResponse};
use modbot_core::{
    format_text, markdown_escape, trim_spaces_before_line, BasicLanguage, CheckLevel,
    ConditionLimit, ForwardOrigin, LangText, LogHandle, ModbotError, ParseMode, Result,
    SendOptions, UpdateContext,
};
use tracing::{debug, info, warn};

use crate::handle::StopSignal;
use crate::helpers::ModuleHelpers;

/// Owner name of the built-in handlers in the chain.
pub const BUILTIN_OWNER: &str = "builtin";
pub const NO_DOC: &str = "No doc";
pub const TO_COMMAND_LIST: &str = "to-command-list";

const STOP_DOC: &str = "stop - stop the bot\nStop the bot.";
const RESTART_DOC: &str = "Restart the bot.";
const DEBUG_MODE_DOC: &str = "debug_mode - switch debug mode on or off\nSwitch debug mode on/off.";
const GET_ID_DOC: &str = "get_id - get the user id / chat id
    Get the user id / chat id.
    If replying to a forwarded message, get the id information of the forward origin.
    Otherwise:
    - In a group chat:
      - If replying to a message, get the user id of the replied message;
      - otherwise, get the id of you and the group.
    - In a private chat: get your id.";
const HELP_DOC: &str = "help - show command helps
    `/help [command]`: get the docstring for commands.
    `/help to-command-list`: get the command list for setting up at BotFather.";
const CANCEL_DOC: &str = "cancel - cancel the current operation\nCancel the current operation.";

/// State the built-in handlers share with the framework.
pub(crate) struct BuiltinState {
    help_docs: OnceLock<Vec<(String, String)>>,
    log: Option<LogHandle>,
    stop: Arc<StopSignal>,
}

impl BuiltinState {
    pub(crate) fn new(log: Option<LogHandle>, stop: Arc<StopSignal>) -> Self {
        Self {
            help_docs: OnceLock::new(),
            log,
            stop,
        }
    }

    /// Records the chain's command docs once. Commands without a doc get [`NO_DOC`].
    pub(crate) fn record_help_docs(&self, command_docs: Vec<(String, Option<String>)>) {
        let docs: Vec<(String, String)> = command_docs
            .into_iter()
            .map(|(name, doc)| (name, doc.unwrap_or_else(|| NO_DOC.to_string())))
            .collect();
        debug!(commands = docs.len(), "Help docs recorded");
        if self.help_docs.set(docs).is_err() {
            warn!("Help docs already recorded, keeping the first set");
        }
    }

    pub(crate) fn help_docs(&self) -> &[(String, String)] {
        self.help_docs.get().map(Vec::as_slice).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy)]
enum Builtin {
    Stop,
    Restart,
    DebugMode,
    GetId,
    Help,
}

struct BuiltinHandler {
    command: Builtin,
    state: Arc<BuiltinState>,
}

#[async_trait]
impl Handler for BuiltinHandler {
    async fn handle(&self, ctx: &UpdateContext) -> Result<HandlerResponse> {
        match self.command {
            Builtin::Stop => {
                ctx.check(CheckLevel::Master, ConditionLimit::ALL)?;
                self.state.stop.request(false);
            }
            Builtin::Restart => {
                ctx.check(CheckLevel::Master, ConditionLimit::ALL)?;
                self.state.stop.request(true);
            }
            Builtin::DebugMode => debug_mode(&self.state, ctx).await?,
            Builtin::GetId => get_id(ctx).await?,
            Builtin::Help => help(&self.state, ctx).await?,
        }
        Ok(HandlerResponse::Stop)
    }
}

/// The built-in command entries, appended after the module handlers.
pub(crate) fn builtin_handlers(state: Arc<BuiltinState>) -> Vec<HandlerEntry> {
    let entry = |name: &str, doc: &str, command: Builtin| {
        HandlerEntry::command(
            name,
            Some(doc),
            Arc::new(BuiltinHandler {
                command,
                state: state.clone(),
            }),
        )
        .owned_by(BUILTIN_OWNER)
    };
    vec![
        entry("stop", STOP_DOC, Builtin::Stop),
        entry("restart", RESTART_DOC, Builtin::Restart),
        entry("debug_mode", DEBUG_MODE_DOC, Builtin::DebugMode),
        entry("get_id", GET_ID_DOC, Builtin::GetId),
        entry("help", HELP_DOC, Builtin::Help),
        HandlerEntry::command("cancel", Some(CANCEL_DOC), ModuleHelpers::cancel_handler())
            .owned_by(BUILTIN_OWNER),
    ]
}

async fn debug_mode(state: &BuiltinState, ctx: &UpdateContext) -> Result<()> {
    ctx.check(CheckLevel::Master, ConditionLimit::ALL)?;
    let log = state
        .log
        .as_ref()
        .ok_or_else(|| ModbotError::Unknown("logging is not initialized".to_string()))?;
    let on = log
        .toggle_debug()
        .map_err(|e| ModbotError::Unknown(e.to_string()))?;
    info!(debug = on, "Debug mode switched");
    let text = if on {
        BasicLanguage::DEBUG_MODE_ON
    } else {
        BasicLanguage::DEBUG_MODE_OFF
    };
    ctx.reply(ctx.t(&text)).await?;
    Ok(())
}

async fn reply_id(ctx: &UpdateContext, text: String) -> Result<()> {
    ctx.reply_with(&text, SendOptions::parse_mode(ParseMode::MarkdownV2))
        .await?;
    Ok(())
}

fn fill(ctx: &UpdateContext, text: &LangText, id: i64) -> String {
    format_text(ctx.t(text), &[&id])
}

async fn get_id(ctx: &UpdateContext) -> Result<()> {
    let replied = ctx
        .update
        .effective_message()
        .and_then(|m| m.reply_to.as_deref());

    if let Some(origin) = replied.and_then(|m| m.forward_origin.as_ref()) {
        return match origin {
            ForwardOrigin::Channel(id) => {
                reply_id(ctx, fill(ctx, &BasicLanguage::FORWARD_FROM_CHANNEL, *id)).await
            }
            ForwardOrigin::Chat(id) => {
                reply_id(ctx, fill(ctx, &BasicLanguage::FORWARD_FROM_GROUP, *id)).await
            }
            ForwardOrigin::User(id) => {
                reply_id(ctx, fill(ctx, &BasicLanguage::FORWARD_FROM_USER, *id)).await
            }
            ForwardOrigin::HiddenUser(_) => {
                ctx.reply(ctx.t(&BasicLanguage::FORWARD_FROM_HIDDEN_USER))
                    .await?;
                Ok(())
            }
        };
    }

    let user_id = ctx.user_id.unwrap_or(ctx.chat_id);
    if ctx.is_group_chat() {
        let group = fill(ctx, &BasicLanguage::GROUP_ID, ctx.chat_id);
        let user = match replied.and_then(|m| m.from.as_ref()) {
            Some(from) => fill(ctx, &BasicLanguage::REPLY_MESSAGE_USER_ID, from.id),
            None => fill(ctx, &BasicLanguage::USER_ID, user_id),
        };
        reply_id(ctx, format!("{}\n{}", group, user)).await
    } else {
        reply_id(ctx, fill(ctx, &BasicLanguage::USER_ID, user_id)).await
    }
}

/// Splits `command - summary` off the first line of `doc`. `None` when the first line is not
/// in that form.
fn split_summary<'a>(command: &str, doc: &'a str) -> Option<(&'a str, &'a str)> {
    let doc = doc.trim();
    let (first, rest) = doc.split_once('\n').unwrap_or((doc, ""));
    first
        .starts_with(&format!("{} - ", command))
        .then_some((first, rest))
}

/// Sorted `command - summary` lines in a code block, or `None` if no doc has a summary line.
pub(crate) fn command_list(docs: &[(String, String)]) -> Option<String> {
    let mut lines: Vec<&str> = docs
        .iter()
        .filter_map(|(command, doc)| split_summary(command, doc).map(|(line, _)| line))
        .collect();
    if lines.is_empty() {
        return None;
    }
    lines.sort_unstable();
    Some(format!("```\n{}\n```", lines.join("\n")))
}

/// Help body of one command: the doc without its summary line, unindented.
pub(crate) fn command_help(command: &str, doc: &str) -> String {
    let body = match split_summary(command, doc) {
        Some((_, rest)) => rest,
        None => doc.trim(),
    };
    let body = trim_spaces_before_line(body);
    if body.trim().is_empty() {
        NO_DOC.to_string()
    } else {
        body
    }
}

async fn help(state: &BuiltinState, ctx: &UpdateContext) -> Result<()> {
    let markdown = SendOptions::parse_mode(ParseMode::Markdown);
    let docs = state.help_docs();

    let Some(command) = ctx.args.first() else {
        let text: String = docs
            .iter()
            .map(|(command, _)| format!("`/help {}`\n", command))
            .collect();
        ctx.reply_with(&text, markdown).await?;
        return Ok(());
    };

    if command == TO_COMMAND_LIST {
        match command_list(docs) {
            Some(list) => {
                ctx.reply_with(&list, markdown).await?;
            }
            None => {
                ctx.error_info("No command list available").await?;
            }
        }
        return Ok(());
    }

    let Some((_, doc)) = docs.iter().find(|(name, _)| name == command) else {
        let text = format_text(ctx.t(&BasicLanguage::NO_SUCH_COMMAND), &[command]);
        ctx.error_info(&text).await?;
        return Ok(());
    };
    let text = format!(
        "/{}:\n{}",
        markdown_escape(command),
        command_help(command, doc)
    );
    ctx.reply_with(&text, markdown).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use modbot_chain::HandlerChain;

    fn docs() -> Vec<(String, String)> {
        vec![
            ("stop".to_string(), STOP_DOC.to_string()),
            ("restart".to_string(), RESTART_DOC.to_string()),
            ("get_id".to_string(), GET_ID_DOC.to_string()),
        ]
    }

    #[test]
    fn test_command_list_is_sorted_code_block() {
        let list = command_list(&docs()).unwrap();
        assert_eq!(
            list,
            "```\nget_id - get the user id / chat id\nstop - stop the bot\n```"
        );
    }

    #[test]
    fn test_command_list_without_summaries() {
        let docs = vec![("restart".to_string(), RESTART_DOC.to_string())];
        assert!(command_list(&docs).is_none());
    }

    #[test]
    fn test_command_help_strips_summary_and_indent() {
        let help = command_help("get_id", GET_ID_DOC);
        assert!(help.starts_with("Get the user id / chat id.\n"));
        assert!(help.contains("\n- In a group chat:\n  - If replying"));
        assert_eq!(command_help("restart", RESTART_DOC), "Restart the bot.");
        assert_eq!(command_help("x", "x - only a summary"), NO_DOC);
    }

    /// **Test: Help docs come from the chain, keep the first route and are recorded once.**
    ///
    /// **Setup:** chain with `/echo` twice (undocumented first) and a callback route.
    /// **Action:** record the chain's command docs, then record a second set.
    /// **Expected:** one `echo` entry with `No doc`; the second set is ignored.
    #[test]
    fn test_help_docs_keep_first_and_fill_missing() {
        let state = BuiltinState::new(None, Arc::new(StopSignal::new()));
        let noop = ModuleHelpers::cancel_handler();
        let chain = HandlerChain::new()
            .add_handler(HandlerEntry::command("echo", None, noop.clone()))
            .add_handler(HandlerEntry::command("echo", Some("echo - again"), noop.clone()))
            .add_handler(HandlerEntry::callback("vote", noop));
        state.record_help_docs(chain.command_docs());
        assert_eq!(state.help_docs(), &[("echo".to_string(), NO_DOC.to_string())]);

        state.record_help_docs(vec![("other".to_string(), Some("other - x".to_string()))]);
        assert_eq!(state.help_docs(), &[("echo".to_string(), NO_DOC.to_string())]);
    }
}
