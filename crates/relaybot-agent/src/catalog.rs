//! Static model catalog and the slash-command tokens derived from it.
//!
//! `qwen/qwq-32b:free` becomes `qwq32b`, selectable as `/qwq32b`.

use std::collections::HashMap;

use relaybot_core::error::{RelayError, Result};
use relaybot_core::types::Model;

use crate::pipeline::slash::BUILTIN_COMMANDS;

/// Canonical command token for a model identifier.
///
/// Takes the segment after the vendor slash, drops any `:tag` suffix,
/// removes `-` and `.`, and lower-cases. Applying it to its own output
/// returns the same token.
pub fn derive_command_token(model_id: &str) -> String {
    let name = model_id.split('/').nth(1).unwrap_or(model_id);
    let name = name.split(':').next().unwrap_or(name);
    name.chars()
        .filter(|c| *c != '-' && *c != '.')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalize free text for comparison against command tokens.
///
/// Strips whitespace, `.`, `:`, `,` and `-`, lower-cases, and drops one
/// leading `/` or `!` command prefix. A command word sent as
/// `/token@botname` loses its `@botname` suffix first.
pub fn normalize_selection(text: &str) -> String {
    let cleaned: String = strip_bot_mention(text.trim())
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '.' | ':' | ',' | '-'))
        .flat_map(char::to_lowercase)
        .collect();
    match cleaned.strip_prefix(['/', '!']) {
        Some(rest) => rest.to_string(),
        None => cleaned,
    }
}

/// `/qwq32b@relay_bot` → `/qwq32b`. Only applies to a single prefixed word.
fn strip_bot_mention(text: &str) -> &str {
    if !text.starts_with(['/', '!']) || text.contains(char::is_whitespace) {
        return text;
    }
    text.split_once('@').map(|(word, _)| word).unwrap_or(text)
}

#[derive(Debug, Clone)]
struct Entry {
    token: String,
    model: Model,
}

/// Validated, ordered model catalog.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    entries: Vec<Entry>,
}

impl ModelCatalog {
    /// Build a catalog, rejecting entries that could never be selected.
    ///
    /// Fails on an empty catalog, an empty token, two models sharing a token,
    /// or a token that shadows a built-in command.
    pub fn new(models: Vec<Model>) -> Result<Self> {
        if models.is_empty() {
            return Err(RelayError::Catalog("no models configured".to_string()));
        }

        let mut seen: HashMap<String, String> = HashMap::new();
        let mut entries = Vec::with_capacity(models.len());
        for model in models {
            let token = derive_command_token(&model.model_id);
            if token.is_empty() {
                return Err(RelayError::Catalog(format!(
                    "model `{}` yields an empty command token",
                    model.model_id
                )));
            }
            if BUILTIN_COMMANDS.contains(&token.as_str()) {
                return Err(RelayError::Catalog(format!(
                    "model `{}` token /{token} shadows a built-in command",
                    model.model_id
                )));
            }
            if let Some(other) = seen.get(&token) {
                return Err(RelayError::Catalog(format!(
                    "models `{other}` and `{}` share the command token /{token}",
                    model.model_id
                )));
            }
            seen.insert(token.clone(), model.model_id.clone());
            entries.push(Entry { token, model });
        }

        Ok(Self { entries })
    }

    /// `(token, display name)` pairs in declaration order.
    pub fn list(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|e| (e.token.clone(), e.model.display_name()))
            .collect()
    }

    /// Resolve user text to a model. First match wins.
    pub fn match_selection(&self, text: &str) -> Option<&Model> {
        let normalized = normalize_selection(text);
        if normalized.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|e| e.token == normalized)
            .map(|e| &e.model)
    }

    /// Token of the first catalog entry, used as an example in help texts.
    pub fn first_token(&self) -> &str {
        self.entries.first().map(|e| e.token.as_str()).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
