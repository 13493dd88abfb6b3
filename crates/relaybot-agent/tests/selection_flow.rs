// End-to-end selection flow: real OpenRouter client against a mock server,
// recording messenger in place of Telegram.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use httpmock::prelude::*;

use relaybot_agent::pipeline::{DeliveryError, Messenger, Outbound};
use relaybot_agent::{ModelCatalog, OpenRouterProvider, SessionRouter};
use relaybot_core::types::{ChatId, InboundMessage, Model, UserId};

#[derive(Default)]
struct Recorder {
    sent: Mutex<Vec<(ChatId, String)>>,
}

#[async_trait]
impl Messenger for Recorder {
    async fn send(&self, chat_id: ChatId, message: Outbound) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push((chat_id, message.text));
        Ok(())
    }
}

fn qwq_catalog() -> ModelCatalog {
    ModelCatalog::new(vec![Model::new("vendor/qwq-32b:free", "QwQ: 32B", "d")]).unwrap()
}

#[tokio::test]
async fn qwq_selection_then_one_completion_call() {
    let server = MockServer::start_async().await;
    let completion = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/chat/completions")
                .header("authorization", "Bearer sk-or-test")
                .body_contains("\"model\":\"vendor/qwq-32b:free\"")
                .body_contains("\"content\":\"Why is the sky blue?\"");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"choices":[{"message":{"content":"Rayleigh scattering."}}]}"#);
        })
        .await;

    let provider = Arc::new(OpenRouterProvider::new(
        "sk-or-test".to_string(),
        Some(server.url("/api/v1/chat/completions")),
    ));
    let recorder = Arc::new(Recorder::default());
    let router = SessionRouter::new(qwq_catalog(), UserId(1), provider, recorder.clone());

    let chat = ChatId(555);
    let user = UserId(555);

    router
        .dispatch(&InboundMessage::new(chat, user, "/models"))
        .await;
    router
        .dispatch(&InboundMessage::new(chat, user, "/qwq32b"))
        .await;
    router
        .dispatch(&InboundMessage::new(chat, user, "Why is the sky blue?"))
        .await;

    completion.assert_hits_async(1).await;

    let sent = recorder.sent.lock().unwrap();
    assert_eq!(sent.len(), 3);
    assert!(sent[0].1.contains("/qwq32b QwQ: 32B"));
    assert_eq!(sent[1].1, "You selected: QwQ: 32B\nd");
    assert_eq!(sent[2].1, "Rayleigh scattering\\.");
}

#[tokio::test]
async fn upstream_failure_is_reported_not_retried() {
    let server = MockServer::start_async().await;
    let completion = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(503).body(r#"{"error":{"message":"overloaded"}}"#);
        })
        .await;

    let provider = Arc::new(OpenRouterProvider::new(
        "k".to_string(),
        Some(server.url("/api/v1/chat/completions")),
    ));
    let recorder = Arc::new(Recorder::default());
    let router = SessionRouter::new(qwq_catalog(), UserId(1), provider, recorder.clone());

    let chat = ChatId(9);
    router.handle_message(chat, "qwq32b").await;
    router.handle_message(chat, "hello").await;

    completion.assert_hits_async(1).await;
    let sent = recorder.sent.lock().unwrap();
    assert_eq!(sent.last().unwrap().1, "⚠️ Error occurred. Status code: 503");
}
