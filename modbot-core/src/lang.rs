//! Multi-language text lookup.
//!
//! Texts are declared as [`LangText`] constants (locale → text pairs) and resolved against the
//! locale chosen by a user or group, falling back to the default locale and then to the first
//! entry. [`LangTable`] is the runtime counterpart used when modules merge their own texts.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LangError {
    #[error("No multi-language text provided by {0}")]
    Empty(String),
}

/// A text in several locales, e.g. `LangText::new("STARTUP", &[("en", "Bot is live!")])`.
#[derive(Debug, Clone, Copy)]
pub struct LangText {
    pub name: &'static str,
    pub entries: &'static [(&'static str, &'static str)],
}

impl LangText {
    pub const fn new(name: &'static str, entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { name, entries }
    }

    pub fn get(&self, locale: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(l, _)| *l == locale)
            .map(|(_, text)| *text)
    }

    fn first(&self) -> Option<&'static str> {
        self.entries.first().map(|(_, text)| *text)
    }
}

/// Default locale plus per-chat overrides. Ids below zero are groups, above zero users.
pub struct LangRegistry {
    default_locale: String,
    overrides: RwLock<HashMap<i64, String>>,
}

impl LangRegistry {
    pub fn new(default_locale: impl Into<String>) -> Self {
        Self {
            default_locale: default_locale.into(),
            overrides: RwLock::new(HashMap::new()),
        }
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn set_lang(&self, id: i64, locale: impl Into<String>) {
        if let Ok(mut overrides) = self.overrides.write() {
            overrides.insert(id, locale.into());
        }
    }

    /// Locale for `id`, or the default when it has no override (or no id is known).
    pub fn locale_for(&self, id: Option<i64>) -> String {
        id.and_then(|id| {
            self.overrides
                .read()
                .ok()
                .and_then(|overrides| overrides.get(&id).cloned())
        })
        .unwrap_or_else(|| self.default_locale.clone())
    }

    /// Resolves `text` for `id`: its locale, then the default locale, then the first entry.
    pub fn resolve(&self, text: &LangText, id: Option<i64>) -> Result<&'static str, LangError> {
        let locale = self.locale_for(id);
        if let Some(found) = text.get(&locale) {
            return Ok(found);
        }
        if let Some(found) = text.get(&self.default_locale) {
            return Ok(found);
        }
        match text.first() {
            Some(found) => {
                warn!(
                    name = text.name,
                    locale = %locale,
                    "No text found for locale, using the first value"
                );
                Ok(found)
            }
            None => Err(LangError::Empty(text.name.to_string())),
        }
    }

    /// Like [`LangRegistry::resolve`], but an empty text is logged and yields `""`.
    pub fn t(&self, text: &LangText, id: Option<i64>) -> &'static str {
        match self.resolve(text, id) {
            Ok(found) => found,
            Err(e) => {
                error!(error = %e, "Language lookup failed");
                ""
            }
        }
    }
}

/// Runtime table of named multi-language texts that modules can merge into.
#[derive(Debug, Clone, Default)]
pub struct LangTable {
    texts: BTreeMap<String, BTreeMap<String, String>>,
}

impl LangTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, text: &LangText) {
        let entry = self.texts.entry(text.name.to_string()).or_default();
        for (locale, value) in text.entries {
            entry.insert(locale.to_string(), value.to_string());
        }
    }

    pub fn from_texts(texts: &[LangText]) -> Self {
        let mut table = Self::new();
        for text in texts {
            table.insert(text);
        }
        table
    }

    /// Adds the texts of `other`; for names present in both, `other`'s locales override.
    pub fn merge(&mut self, other: &LangTable) {
        for (name, locales) in &other.texts {
            let entry = self.texts.entry(name.clone()).or_default();
            for (locale, value) in locales {
                entry.insert(locale.clone(), value.clone());
            }
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.texts.keys().map(String::as_str)
    }

    /// Looks up `name` in `locale`, falling back to `default_locale`, then any locale.
    pub fn lookup(&self, name: &str, locale: &str, default_locale: &str) -> Result<&str, LangError> {
        let locales = self
            .texts
            .get(name)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| LangError::Empty(name.to_string()))?;
        locales
            .get(locale)
            .or_else(|| locales.get(default_locale))
            .or_else(|| locales.values().next())
            .map(String::as_str)
            .ok_or_else(|| LangError::Empty(name.to_string()))
    }
}

/// Fills `{}` placeholders in order. Surplus placeholders are left as they are.
pub fn format_text(template: &str, args: &[&dyn std::fmt::Display]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut rest = template;
    while let Some(pos) = rest.find("{}") {
        out.push_str(&rest[..pos]);
        match args.next() {
            Some(arg) => out.push_str(&arg.to_string()),
            None => out.push_str("{}"),
        }
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}

/// Texts used by the framework itself.
pub struct BasicLanguage;

impl BasicLanguage {
    pub const CANCELLED: LangText =
        LangText::new("CANCELLED", &[("zh-CN", "操作取消～"), ("en", "Cancelled~")]);
    pub const END: LangText = LangText::new("END", &[("zh-CN", "结束"), ("en", "END")]);
    pub const INVALID_CHAT_TYPE: LangText = LangText::new(
        "INVALID_CHAT_TYPE",
        &[
            ("zh-CN", "不能在聊天类型：{}中使用哦"),
            ("en", "Cannot be used in chat type: {}"),
        ],
    );
    pub const NO_PERMISSION: LangText = LangText::new(
        "NO_PERMISSION",
        &[
            ("zh-CN", "你没有权限哦"),
            ("en", "Oops, you don't have permission..."),
        ],
    );
    pub const SHORTSEP: LangText = LangText::new("SHORTSEP", &[("zh-CN", "、"), ("en", ", ")]);
    pub const STARTUP: LangText =
        LangText::new("STARTUP", &[("zh-CN", "Bot启动！"), ("en", "Bot is live!")]);
    pub const SHUTDOWN_GOODBYE: LangText = LangText::new(
        "SHUTDOWN_GOODBYE",
        &[("zh-CN", "Bot关闭，再见～"), ("en", "Bot is shutting down, goodbye~")],
    );
    pub const UNKNOWN_ERROR: LangText = LangText::new(
        "UNKNOWN_ERROR",
        &[
            ("zh-CN", "哎呀，出现了未知的错误呢……"),
            ("en", "Oops, an unknown error occurred..."),
        ],
    );
    pub const DEBUG_MODE_ON: LangText = LangText::new(
        "DEBUG_MODE_ON",
        &[("zh-CN", "调试模式已开启"), ("en", "Debug mode on")],
    );
    pub const DEBUG_MODE_OFF: LangText = LangText::new(
        "DEBUG_MODE_OFF",
        &[("zh-CN", "调试模式已关闭"), ("en", "Debug mode off")],
    );
    pub const NO_SUCH_COMMAND: LangText = LangText::new(
        "NO_SUCH_COMMAND",
        &[("zh-CN", "没有这个指令：{}"), ("en", "No such command: {}")],
    );
    pub const GROUP_ID: LangText =
        LangText::new("GROUP_ID", &[("zh-CN", "群号：`{}`"), ("en", "Group id: `{}`")]);
    pub const USER_ID: LangText =
        LangText::new("USER_ID", &[("zh-CN", "用户id：`{}`"), ("en", "User id: `{}`")]);
    pub const REPLY_MESSAGE_USER_ID: LangText = LangText::new(
        "REPLY_MESSAGE_USER_ID",
        &[
            ("zh-CN", "回复的消息的用户id：`{}`"),
            ("en", "Replied message user id: `{}`"),
        ],
    );
    pub const FORWARD_FROM_USER: LangText = LangText::new(
        "FORWARD_FROM_USER",
        &[
            ("zh-CN", "转发来源用户id：`{}`"),
            ("en", "Forwarded from user: `{}`"),
        ],
    );
    pub const FORWARD_FROM_GROUP: LangText = LangText::new(
        "FORWARD_FROM_GROUP",
        &[
            ("zh-CN", "转发来源群id：`{}`"),
            ("en", "Forwarded from group: `{}`"),
        ],
    );
    pub const FORWARD_FROM_CHANNEL: LangText = LangText::new(
        "FORWARD_FROM_CHANNEL",
        &[
            ("zh-CN", "转发来源频道id：`{}`"),
            ("en", "Forwarded from channel: `{}`"),
        ],
    );
    pub const FORWARD_FROM_HIDDEN_USER: LangText = LangText::new(
        "FORWARD_FROM_HIDDEN_USER",
        &[
            ("zh-CN", "转发来源用户隐藏了自己的id"),
            ("en", "The original sender hides their account"),
        ],
    );
    pub const INVALID_BUTTON: LangText = LangText::new(
        "INVALID_BUTTON",
        &[
            ("zh-CN", "这个按钮无效了呢……"),
            ("en", "This button is no longer valid..."),
        ],
    );

    pub const ALL: &'static [LangText] = &[
        Self::CANCELLED,
        Self::END,
        Self::INVALID_CHAT_TYPE,
        Self::NO_PERMISSION,
        Self::SHORTSEP,
        Self::STARTUP,
        Self::SHUTDOWN_GOODBYE,
        Self::UNKNOWN_ERROR,
        Self::DEBUG_MODE_ON,
        Self::DEBUG_MODE_OFF,
        Self::NO_SUCH_COMMAND,
        Self::GROUP_ID,
        Self::USER_ID,
        Self::REPLY_MESSAGE_USER_ID,
        Self::FORWARD_FROM_USER,
        Self::FORWARD_FROM_GROUP,
        Self::FORWARD_FROM_CHANNEL,
        Self::FORWARD_FROM_HIDDEN_USER,
        Self::INVALID_BUTTON,
    ];
}
