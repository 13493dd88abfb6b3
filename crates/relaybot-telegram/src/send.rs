//! Message sending for the Telegram adapter.
//!
//! MarkdownV2 messages are sent with that parse mode first; if Telegram
//! rejects the markup (a chunk split mid-entity, a stray reserved char) the
//! same text is resent as plain text with the escapes stripped.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, ParseMode};
use tracing::{debug, warn};

use relaybot_agent::pipeline::{DeliveryError, Messenger, Outbound, TextFormat};
use relaybot_core::types::ChatId as RelayChatId;

/// Characters that carry a backslash escape in MarkdownV2.
const ESCAPABLE: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    '\\',
];

/// Undo MarkdownV2 backslash escapes for the plain-text fallback.
///
/// Formatting markers (`*`, `_`, ...) are left as they are.
pub fn strip_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(&next) = chars.peek() {
                if ESCAPABLE.contains(&next) {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(ch);
    }
    out
}

/// [`Messenger`] backed by a teloxide `Bot`.
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    async fn send_plain(&self, chat_id: RelayChatId, text: &str) -> Result<(), DeliveryError> {
        self.bot
            .send_message(ChatId(chat_id.0), text)
            .await
            .map(|_| ())
            .map_err(|e| DeliveryError {
                chat_id,
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send(&self, chat_id: RelayChatId, message: Outbound) -> Result<(), DeliveryError> {
        match message.format {
            TextFormat::Plain => self.send_plain(chat_id, &message.text).await,
            TextFormat::MarkdownV2 => {
                let sent = self
                    .bot
                    .send_message(ChatId(chat_id.0), &message.text)
                    .parse_mode(ParseMode::MarkdownV2)
                    .await;

                match sent {
                    Ok(_) => Ok(()),
                    Err(e) => {
                        debug!(%chat_id, error = %e, "Telegram: MarkdownV2 rejected, sending plain text");
                        let plain = strip_markdown_v2(&message.text);
                        self.send_plain(chat_id, &plain).await.inspect_err(|e| {
                            warn!(%chat_id, error = %e, "Telegram: failed to send plain-text fallback");
                        })
                    }
                }
            }
        }
    }

    async fn typing(&self, chat_id: RelayChatId) {
        let _ = self
            .bot
            .send_chat_action(ChatId(chat_id.0), ChatAction::Typing)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaybot_core::markdown::to_markdown_v2;

    #[test]
    fn strip_removes_escapes() {
        assert_eq!(strip_markdown_v2("Hello\\. World\\!"), "Hello. World!");
        assert_eq!(strip_markdown_v2("a\\\\b"), "a\\b");
    }

    #[test]
    fn strip_keeps_markers_and_lone_backslash() {
        assert_eq!(strip_markdown_v2("*bold* \\q"), "*bold* \\q");
        assert_eq!(strip_markdown_v2("trailing\\"), "trailing\\");
    }

    #[test]
    fn strip_reverses_rendered_plain_text() {
        let source = "Prices (2024): 1+1=2 - done!";
        assert_eq!(strip_markdown_v2(&to_markdown_v2(source)), source);
    }
}
