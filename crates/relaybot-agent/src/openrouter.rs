use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use relaybot_core::config::DEFAULT_COMPLETION_URL;

use crate::provider::{
    ChatRequest, ChatResponse, CompletionProvider, Message, ProviderError, Sampling, SAMPLING,
};

/// OpenRouter chat-completions client.
///
/// One POST per request, no retries. Anything other than `200 OK` is
/// reported as [`ProviderError::Api`] with the raw body.
pub struct OpenRouterProvider {
    client: reqwest::Client,
    api_key: String,
    url: String,
}

impl OpenRouterProvider {
    pub fn new(api_key: String, url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            url: url.unwrap_or_else(|| DEFAULT_COMPLETION_URL.to_string()),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let body = RequestBody {
            model: &req.model,
            messages: &req.messages,
            sampling: SAMPLING,
        };

        debug!(model = %req.model, "sending request to OpenRouter");

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if status != StatusCode::OK {
            warn!(status = status.as_u16(), body = %text, "OpenRouter API error");
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let api_resp: ApiResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(ChatResponse {
            content: api_resp.first_content(),
        })
    }
}

#[derive(Serialize)]
struct RequestBody<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(flatten)]
    sampling: Sampling,
}

// Every level is optional; a missing field means "no content", not an error.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ApiResponse {
    /// `choices[0].message.content`, or `""` if any step is absent.
    fn first_content(self) -> String {
        self.choices
            .and_then(|choices| choices.into_iter().next())
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default()
    }
}
