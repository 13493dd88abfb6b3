use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a Telegram conversation (private chat, group or channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the Telegram user who sent a message. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A completion target from the static catalog.
///
/// `model_id` is the upstream identifier in `vendor/name:tag` form,
/// `name` a `"short: long"` display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub model_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Model {
    pub fn new(
        model_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            name: name.into(),
            description: description.into(),
        }
    }

    /// Display label with both halves of `"short:long"` trimmed and re-joined.
    ///
    /// Names without a colon are returned trimmed.
    pub fn display_name(&self) -> String {
        match self.name.split_once(':') {
            Some((short, long)) => format!("{}: {}", short.trim(), long.trim()),
            None => self.name.trim().to_string(),
        }
    }
}

/// A text message received from the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub from_user_id: UserId,
    pub text: String,
}

impl InboundMessage {
    pub fn new(chat_id: ChatId, from_user_id: UserId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            from_user_id,
            text: text.into(),
        }
    }
}
