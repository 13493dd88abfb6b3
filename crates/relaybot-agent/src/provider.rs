use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single message in the request conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Every request is a single user turn, so `user` is the only role sent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

/// Sampling settings sent with every completion request.
///
/// Fixed for the whole process; callers cannot tune them.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Sampling {
    pub top_p: f64,
    pub temperature: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
    pub repetition_penalty: f64,
    pub top_k: u32,
}

pub const SAMPLING: Sampling = Sampling {
    top_p: 1.0,
    temperature: 0.9,
    frequency_penalty: 0.0,
    presence_penalty: 0.0,
    repetition_penalty: 1.0,
    top_k: 0,
};

/// Request to a completion provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
}

impl ChatRequest {
    /// One user-role message for `model`.
    pub fn single_turn(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![Message {
                role: Role::User,
                content: text.into(),
            }],
        }
    }
}

/// Response from a completion provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    /// Assistant text; empty when the upstream omitted it.
    pub content: String,
}

/// Common interface for completion backends.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name for logging and error messages.
    fn name(&self) -> &str;

    /// Send one non-streaming chat request and wait for the full response.
    async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),
}
