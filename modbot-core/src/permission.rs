//! Permission checks run at the top of command handlers.

use std::ops::BitOr;

use crate::context::UpdateContext;
use crate::error::PermissionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckLevel {
    Master,
    Admin,
    User,
    Any,
}

/// Chat kinds a handler accepts, as a bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionLimit(u8);

impl ConditionLimit {
    pub const GROUP: Self = Self(1);
    pub const PRIVATE: Self = Self(2);
    pub const CHANNEL: Self = Self(4);
    pub const CALLBACK_QUERY: Self = Self(8);
    pub const CHAT: Self = Self(1 | 2);
    pub const ALL: Self = Self(0xf);

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Whether every bit of `other` is set in `self`.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for ConditionLimit {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for ConditionLimit {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Checks the chat kind against `limit`, then the caller against `level`.
pub fn permission_check(
    ctx: &UpdateContext,
    level: CheckLevel,
    limit: ConditionLimit,
) -> Result<(), PermissionError> {
    if ctx.is_private_chat() {
        if !limit.contains(ConditionLimit::PRIVATE) {
            return Err(PermissionError::InvalidChatType);
        }
    } else if ctx.is_group_chat() {
        if !limit.contains(ConditionLimit::GROUP) {
            return Err(PermissionError::InvalidChatType);
        }
    } else if ctx.is_channel_message() && !limit.contains(ConditionLimit::CHANNEL) {
        return Err(PermissionError::IgnoreChannel);
    }
    match level {
        CheckLevel::Master => {
            let is_master =
                ctx.chat_id == ctx.master_id || ctx.user_id == Some(ctx.master_id);
            if is_master {
                Ok(())
            } else {
                Err(PermissionError::InvalidUser)
            }
        }
        CheckLevel::Admin | CheckLevel::User | CheckLevel::Any => Ok(()),
    }
}
