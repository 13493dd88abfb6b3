use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};
use crate::types::{Model, UserId};

pub const DEFAULT_COMPLETION_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_PRIVACY_POLICY: &str = "🔐 We ensure your privacy.";

/// Bare environment variables accepted in addition to the `RELAYBOT_*` ones.
const BARE_ENV_KEYS: [&str; 3] = ["BOT_TOKEN", "OPENROUTER_API_KEY", "OWNER_ID"];

/// Top-level config (relaybot.toml + RELAYBOT_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Telegram bot token issued by @BotFather.
    pub bot_token: String,
    /// Bearer token for the completion endpoint.
    pub openrouter_api_key: String,
    /// Telegram user allowed to run `/ownerannouncement`.
    pub owner_id: u64,
    #[serde(default = "default_completion_url")]
    pub completion_url: String,
    #[serde(default = "default_privacy_policy")]
    pub privacy_policy: String,
    /// Model catalog, in the order it is listed to users.
    #[serde(default = "default_models")]
    pub models: Vec<Model>,
}

impl RelayConfig {
    /// Load config from a TOML file with env var overrides.
    ///
    /// Precedence (later wins):
    ///   1. TOML file (explicit path, else ~/.relaybot/relaybot.toml; missing is fine)
    ///   2. `RELAYBOT_*` env vars
    ///   3. `BOT_TOKEN`, `OPENROUTER_API_KEY`, `OWNER_ID`
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        tracing::debug!(path = %path, "loading configuration");

        let figment = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("RELAYBOT_"))
            .merge(Env::raw().only(&BARE_ENV_KEYS));

        Self::from_figment(figment)
    }

    /// Extract and validate a config from an already-assembled figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: RelayConfig = figment
            .extract()
            .map_err(|e| RelayError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn owner(&self) -> UserId {
        UserId(self.owner_id)
    }

    fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            return Err(RelayError::Config("bot_token is empty".to_string()));
        }
        if self.openrouter_api_key.trim().is_empty() {
            return Err(RelayError::Config(
                "openrouter_api_key is empty".to_string(),
            ));
        }
        if self.models.is_empty() {
            return Err(RelayError::Config("model catalog is empty".to_string()));
        }
        Ok(())
    }
}

fn default_completion_url() -> String {
    DEFAULT_COMPLETION_URL.to_string()
}
fn default_privacy_policy() -> String {
    DEFAULT_PRIVACY_POLICY.to_string()
}

/// Catalog used when the config file does not declare `[[models]]`.
pub fn default_models() -> Vec<Model> {
    vec![
        Model::new(
            "qwen/qwq-32b:free",
            "QwQ: 32B",
            "Qwen reasoning model, strong at math and code.",
        ),
        Model::new(
            "mistralai/mistral-small-3.1-24b-instruct:free",
            "Mistral: Small 3.1 24B Instruct",
            "Fast general-purpose instruction model.",
        ),
        Model::new(
            "deepseek/deepseek-chat-v3-0324:free",
            "DeepSeek: V3 0324",
            "Large mixture-of-experts chat model.",
        ),
        Model::new(
            "google/gemma-3-27b-it:free",
            "Google: Gemma 3 27B",
            "Open multilingual model from Google.",
        ),
        Model::new(
            "meta-llama/llama-3.3-70b-instruct:free",
            "Meta: Llama 3.3 70B Instruct",
            "Multilingual instruction-tuned Llama.",
        ),
    ]
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.relaybot/relaybot.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(src: &str) -> Result<RelayConfig> {
        RelayConfig::from_figment(Figment::from(Toml::string(src)))
    }

    #[test]
    fn minimal_config_fills_defaults() {
        let config = from_toml(
            r#"
            bot_token = "123:abc"
            openrouter_api_key = "sk-or-1"
            owner_id = 42
            "#,
        )
        .unwrap();

        assert_eq!(config.owner(), UserId(42));
        assert_eq!(config.completion_url, DEFAULT_COMPLETION_URL);
        assert_eq!(config.privacy_policy, DEFAULT_PRIVACY_POLICY);
        assert_eq!(config.models, default_models());
    }

    #[test]
    fn models_table_overrides_default_catalog() {
        let config = from_toml(
            r#"
            bot_token = "123:abc"
            openrouter_api_key = "sk-or-1"
            owner_id = 42

            [[models]]
            model_id = "vendor/qwq-32b:free"
            name = "QwQ: 32B"
            description = "d"
            "#,
        )
        .unwrap();

        assert_eq!(config.models.len(), 1);
        assert_eq!(config.models[0].model_id, "vendor/qwq-32b:free");
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let err = from_toml(
            r#"
            bot_token = "123:abc"
            owner_id = 42
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }

    #[test]
    fn missing_owner_is_an_error() {
        let err = from_toml(
            r#"
            bot_token = "123:abc"
            openrouter_api_key = "sk-or-1"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("owner_id"));
    }

    #[test]
    fn negative_owner_is_an_error() {
        let err = from_toml(
            r#"
            bot_token = "123:abc"
            openrouter_api_key = "sk-or-1"
            owner_id = -42
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }

    #[test]
    fn blank_api_key_is_an_error() {
        let err = from_toml(
            r#"
            bot_token = "123:abc"
            openrouter_api_key = "  "
            owner_id = 42
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("openrouter_api_key"));
    }

    #[test]
    fn empty_catalog_is_an_error() {
        let err = from_toml(
            r#"
            bot_token = "123:abc"
            openrouter_api_key = "sk-or-1"
            owner_id = 42
            models = []
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("catalog"));
    }
}
