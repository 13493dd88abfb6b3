//! Telegram message handler registered in the teloxide Dispatcher.

use std::sync::Arc;

use teloxide::prelude::*;

use relaybot_agent::SessionRouter;
use relaybot_core::types::{ChatId as RelayChatId, InboundMessage, UserId};

/// Main message handler registered in the teloxide Dispatcher.
///
/// Filters out bot senders and non-text messages, then hands the update to
/// the router. Runs inline: teloxide already serializes updates per chat.
pub async fn handle_message(msg: Message, router: Arc<SessionRouter>) -> ResponseResult<()> {
    if let Some(inbound) = to_inbound(&msg) {
        router.dispatch(&inbound).await;
    }
    Ok(())
}

/// Convert a Telegram message into the router's input, if it is one we answer.
pub fn to_inbound(msg: &Message) -> Option<InboundMessage> {
    let from = msg.from.as_ref()?;
    if from.is_bot {
        return None;
    }
    let text = msg.text()?;

    Some(InboundMessage::new(
        RelayChatId(msg.chat.id.0),
        UserId(from.id.0),
        text,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(from_is_bot: bool, text: Option<&str>) -> Message {
        serde_json::from_value(message_json(from_is_bot, text)).unwrap()
    }

    fn message_json(from_is_bot: bool, text: Option<&str>) -> serde_json::Value {
        let mut json = serde_json::json!({
            "message_id": 1,
            "date": 1_700_000_000,
            "chat": { "id": 42, "type": "private", "first_name": "Ada" },
            "from": { "id": 7, "is_bot": from_is_bot, "first_name": "Ada" },
        });
        if let Some(text) = text {
            json["text"] = serde_json::Value::from(text);
        } else {
            json["photo"] = serde_json::json!([
                { "file_id": "f", "file_unique_id": "u", "width": 90, "height": 90 }
            ]);
        }
        json
    }

    #[test]
    fn text_message_becomes_inbound() {
        let inbound = to_inbound(&message(false, Some("/qwq32b"))).unwrap();
        assert_eq!(inbound.chat_id, RelayChatId(42));
        assert_eq!(inbound.from_user_id, UserId(7));
        assert_eq!(inbound.text, "/qwq32b");
    }

    #[test]
    fn large_user_ids_are_kept_whole() {
        let mut json = message_json(false, Some("hi"));
        json["from"]["id"] = serde_json::Value::from(9_007_199_254_740_991_u64);
        let msg: Message = serde_json::from_value(json).unwrap();
        assert_eq!(to_inbound(&msg).unwrap().from_user_id, UserId(9_007_199_254_740_991));
    }

    #[test]
    fn bot_senders_are_ignored() {
        assert!(to_inbound(&message(true, Some("hello"))).is_none());
    }

    #[test]
    fn non_text_messages_are_ignored() {
        assert!(to_inbound(&message(false, None)).is_none());
    }
}
