//! Per-chat model selection and message dispatch.
//!
//! Each chat is either *unselected* or *selected* (bound to one catalog
//! model). Free text in a selected chat is proxied to the completion
//! provider; everything else is answered locally.

use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use tracing::{debug, error, info, instrument, warn};

use relaybot_core::config::{RelayConfig, DEFAULT_PRIVACY_POLICY};
use relaybot_core::error::Result;
use relaybot_core::markdown::{escape_markdown_v2, to_markdown_v2};
use relaybot_core::types::{ChatId, InboundMessage, Model, UserId};

use crate::catalog::ModelCatalog;
use crate::pipeline::chunk::{split_message, CHUNK_MAX};
use crate::pipeline::context::{Messenger, Outbound};
use crate::pipeline::slash::{parse_command, Command};
use crate::provider::{ChatRequest, CompletionProvider, ProviderError};

pub const GOODBYE_TEXT: &str = "Goodbye! Feel free to start a new chat anytime.";
pub const UNSELECTED_TEXT: &str =
    "I'm not sure how to respond to that. Use /models to select a model.";
pub const INVALID_RESPONSE_TEXT: &str = "⚠️ Sorry, I received an invalid JSON response.";
pub const ANNOUNCEMENT_PREFIX: &str = "📢 Announcement:\n";

/// Why an announcement was refused. `Display` is the text shown to the requester.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnnouncementError {
    #[error("❌ You are not authorized to use this command.")]
    Unauthorized,

    #[error("⚠️ Please provide an announcement message after the command.")]
    EmptyBody,
}

/// Outcome of an announcement fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnnouncementReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Owns all chat state: the selection map and the set of known chats.
///
/// Built once at startup and shared behind an `Arc`.
pub struct SessionRouter {
    catalog: ModelCatalog,
    owner: UserId,
    privacy_policy: String,
    provider: Arc<dyn CompletionProvider>,
    messenger: Arc<dyn Messenger>,
    selections: DashMap<ChatId, Model>,
    known_chats: DashSet<ChatId>,
}

impl SessionRouter {
    pub fn new(
        catalog: ModelCatalog,
        owner: UserId,
        provider: Arc<dyn CompletionProvider>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            catalog,
            owner,
            privacy_policy: DEFAULT_PRIVACY_POLICY.to_string(),
            provider,
            messenger,
            selections: DashMap::new(),
            known_chats: DashSet::new(),
        }
    }

    /// Build a router from loaded config. Fails if the catalog is invalid.
    pub fn from_config(
        config: &RelayConfig,
        provider: Arc<dyn CompletionProvider>,
        messenger: Arc<dyn Messenger>,
    ) -> Result<Self> {
        let catalog = ModelCatalog::new(config.models.clone())?;
        Ok(Self::new(catalog, config.owner(), provider, messenger)
            .with_privacy_policy(config.privacy_policy.clone()))
    }

    pub fn with_privacy_policy(mut self, text: impl Into<String>) -> Self {
        self.privacy_policy = text.into();
        self
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Model currently bound to `chat_id`, if any.
    pub fn selected_model(&self, chat_id: ChatId) -> Option<Model> {
        self.selections.get(&chat_id).map(|m| m.value().clone())
    }

    pub fn is_known(&self, chat_id: ChatId) -> bool {
        self.known_chats.contains(&chat_id)
    }

    pub fn known_chat_count(&self) -> usize {
        self.known_chats.len()
    }

    /// `(token, display name)` for every catalog model, in catalog order.
    pub fn list_models(&self) -> Vec<(String, String)> {
        self.catalog.list()
    }

    /// Entry point for every inbound text message.
    #[instrument(skip(self, inbound), fields(chat_id = %inbound.chat_id))]
    pub async fn dispatch(&self, inbound: &InboundMessage) {
        self.known_chats.insert(inbound.chat_id);

        match parse_command(&inbound.text) {
            Some(Command::Start) => self.handle_start(inbound.chat_id).await,
            Some(Command::Models) => self.handle_models(inbound.chat_id).await,
            Some(Command::PrivacyPolicy) => self.handle_privacy_policy(inbound.chat_id).await,
            Some(Command::OwnerAnnouncement { body }) => {
                if let Err(e) = self
                    .handle_announcement(inbound.chat_id, inbound.from_user_id, body)
                    .await
                {
                    debug!(requester = %inbound.from_user_id, reason = ?e, "announcement refused");
                }
            }
            None => self.handle_message(inbound.chat_id, &inbound.text).await,
        }
    }

    /// Greet the chat and drop any model selection.
    pub async fn handle_start(&self, chat_id: ChatId) {
        let example = self.catalog.first_token();
        let text = format!(
            "Hi, I am your AI assistant\\! 🤖\n\
             Please select a model from the list using /models\\.\n\
             To select a model, send its corresponding command \\(e\\.g\\., `/{example}`\\)\\."
        );
        self.reply(chat_id, Outbound::markdown_v2(text)).await;

        if self.selections.remove(&chat_id).is_some() {
            debug!(%chat_id, "selection cleared by /start");
        }
    }

    /// Send the model listing, one `/<token> <name>` line per model.
    pub async fn handle_models(&self, chat_id: ChatId) {
        let lines: Vec<String> = self
            .list_models()
            .into_iter()
            .map(|(token, name)| escape_markdown_v2(&format!("/{token} {name}")))
            .collect();
        let example = self.catalog.first_token();
        let text = format!(
            "Available models:\n{}\n\n\
             To select a model, send its corresponding command \\(e\\.g\\., `/{example}`\\)\\.",
            lines.join("\n")
        );
        self.reply(chat_id, Outbound::markdown_v2(text)).await;
    }

    pub async fn handle_privacy_policy(&self, chat_id: ChatId) {
        self.reply(chat_id, Outbound::plain(self.privacy_policy.clone()))
            .await;
    }

    /// Selection state machine for non-command text.
    ///
    /// `exit` unselects, a model token selects, anything else is proxied
    /// when a model is selected and answered with a hint otherwise.
    pub async fn handle_message(&self, chat_id: ChatId, text: &str) {
        self.known_chats.insert(chat_id);

        if text.trim().eq_ignore_ascii_case("exit") {
            self.selections.remove(&chat_id);
            self.reply(chat_id, Outbound::plain(GOODBYE_TEXT)).await;
            return;
        }

        if let Some(model) = self.catalog.match_selection(text) {
            info!(%chat_id, model = %model.model_id, "model selected");
            self.selections.insert(chat_id, model.clone());
            let confirmation = format!("You selected: {}\n{}", model.name, model.description);
            self.reply(chat_id, Outbound::plain(confirmation)).await;
            return;
        }

        match self.selected_model(chat_id) {
            Some(model) => self.complete_chat(chat_id, &model, text).await,
            None => self.reply(chat_id, Outbound::plain(UNSELECTED_TEXT)).await,
        }
    }

    /// Owner-only broadcast to every known chat.
    ///
    /// The requester is told the outcome either way. Individual delivery
    /// failures are logged and skipped.
    pub async fn handle_announcement(
        &self,
        chat_id: ChatId,
        requester: UserId,
        body: &str,
    ) -> std::result::Result<AnnouncementReport, AnnouncementError> {
        if requester != self.owner {
            let err = AnnouncementError::Unauthorized;
            self.reply(chat_id, Outbound::plain(err.to_string())).await;
            return Err(err);
        }

        let body = body.trim();
        if body.is_empty() {
            let err = AnnouncementError::EmptyBody;
            self.reply(chat_id, Outbound::plain(err.to_string())).await;
            return Err(err);
        }

        // Snapshot first: no DashSet guard may be held across an await.
        let mut recipients: Vec<ChatId> = self.known_chats.iter().map(|c| *c).collect();
        recipients.sort();

        let text = format!("{ANNOUNCEMENT_PREFIX}{body}");
        let mut report = AnnouncementReport::default();
        for recipient in recipients {
            match self
                .messenger
                .send(recipient, Outbound::plain(text.clone()))
                .await
            {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(chat_id = %recipient, error = %e, "announcement delivery failed");
                    report.failed += 1;
                }
            }
        }

        info!(
            delivered = report.delivered,
            failed = report.failed,
            "announcement fan-out complete"
        );
        let summary = format!(
            "✅ Announcement sent to {} of {} chats.",
            report.delivered,
            report.delivered + report.failed
        );
        self.reply(chat_id, Outbound::plain(summary)).await;
        Ok(report)
    }

    /// Proxy `text` to `model` and deliver the formatted reply in chunks.
    pub async fn complete_chat(&self, chat_id: ChatId, model: &Model, text: &str) {
        self.messenger.typing(chat_id).await;

        let req = ChatRequest::single_turn(model.model_id.clone(), text);
        match self.provider.send(&req).await {
            Ok(resp) => {
                let formatted = to_markdown_v2(&resp.content);
                let chunks = split_message(formatted.trim(), CHUNK_MAX);
                if chunks.is_empty() {
                    warn!(%chat_id, model = %model.model_id, "completion returned no content");
                }
                for chunk in chunks {
                    self.reply(chat_id, Outbound::markdown_v2(chunk)).await;
                }
            }
            Err(ProviderError::Api { status, .. }) => {
                warn!(%chat_id, status, provider = self.provider.name(), "completion rejected");
                self.reply(
                    chat_id,
                    Outbound::plain(format!("⚠️ Error occurred. Status code: {status}")),
                )
                .await;
            }
            Err(ProviderError::Parse(e)) => {
                warn!(%chat_id, error = %e, "completion body was not valid JSON");
                self.reply(chat_id, Outbound::plain(INVALID_RESPONSE_TEXT))
                    .await;
            }
            Err(e) => {
                error!(%chat_id, error = ?e, provider = self.provider.name(), "unexpected error during completion request");
                self.reply(
                    chat_id,
                    Outbound::plain(format!("⚠️ An unexpected error occurred: {e}")),
                )
                .await;
            }
        }
    }

    async fn reply(&self, chat_id: ChatId, message: Outbound) {
        if let Err(e) = self.messenger.send(chat_id, message).await {
            warn!(%chat_id, error = %e, "failed to send reply");
        }
    }
}
