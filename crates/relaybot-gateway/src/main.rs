use std::sync::Arc;

use clap::Parser;
use tracing::info;

use relaybot_agent::{OpenRouterProvider, SessionRouter};
use relaybot_core::config::RelayConfig;
use relaybot_telegram::TelegramAdapter;

/// Telegram bot that routes each chat to a selected OpenRouter model.
#[derive(Debug, Parser)]
#[command(name = "relaybot", version, about)]
struct Args {
    /// Path to relaybot.toml (default: ~/.relaybot/relaybot.toml).
    #[arg(long, env = "RELAYBOT_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "relaybot_gateway=info,relaybot_agent=info,relaybot_telegram=info".into()
            }),
        )
        .init();

    let args = Args::parse();

    // Missing secrets or a bad catalog stop the process here, never per request.
    let config = RelayConfig::load(args.config.as_deref())?;
    info!(
        models = config.models.len(),
        owner = config.owner_id,
        endpoint = %config.completion_url,
        "configuration loaded"
    );

    let provider = Arc::new(OpenRouterProvider::new(
        config.openrouter_api_key.clone(),
        Some(config.completion_url.clone()),
    ));

    let adapter = TelegramAdapter::new(&config);
    let messenger = Arc::new(adapter.messenger());
    let router = Arc::new(SessionRouter::from_config(&config, provider, messenger)?);

    for (token, name) in router.list_models() {
        info!(command = %format!("/{token}"), %name, "model available");
    }

    adapter.run(router).await;
    Ok(())
}
