//! Outbound side of the pipeline.
//!
//! `Messenger` is the only thing the router knows about the chat platform.
//! The Telegram adapter implements it over a teloxide `Bot`; tests use an
//! in-memory recorder.

use async_trait::async_trait;

use relaybot_core::types::ChatId;

/// How the platform should interpret `Outbound::text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Plain,
    /// Already rendered and escaped Telegram MarkdownV2.
    MarkdownV2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub text: String,
    pub format: TextFormat,
}

impl Outbound {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::Plain,
        }
    }

    pub fn markdown_v2(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::MarkdownV2,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("delivery to chat {chat_id} failed: {reason}")]
pub struct DeliveryError {
    pub chat_id: ChatId,
    pub reason: String,
}

/// Delivers messages to chats on the hosting platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send one message. Length limits are the caller's concern.
    async fn send(&self, chat_id: ChatId, message: Outbound) -> Result<(), DeliveryError>;

    /// Show a "typing…" hint while a completion is in flight. Best effort.
    async fn typing(&self, _chat_id: ChatId) {}
}
