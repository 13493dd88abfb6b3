//! Telegram channel adapter.
//!
//! Wraps a teloxide `Bot` + `Dispatcher` and drives the long-polling event loop
//! until the process exits.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::BotCommand;
use tracing::{info, warn};

use relaybot_agent::SessionRouter;
use relaybot_core::config::RelayConfig;

use crate::error::TelegramError;
use crate::handler::handle_message;
use crate::send::TelegramMessenger;

/// Telegram channel adapter. Long polling, no public URL required.
pub struct TelegramAdapter {
    bot: Bot,
}

impl TelegramAdapter {
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            bot: Bot::new(&config.bot_token),
        }
    }

    /// Outbound side for the router, sharing this adapter's bot.
    pub fn messenger(&self) -> TelegramMessenger {
        TelegramMessenger::new(self.bot.clone())
    }

    /// Register the command menu, then drive the long-polling loop.
    ///
    /// Returns only when the dispatcher shuts down (Ctrl-C).
    pub async fn run(self, router: Arc<SessionRouter>) {
        if let Err(e) = register_commands(&self.bot).await {
            warn!(error = %e, "Telegram: failed to register bot commands");
        }

        info!(
            models = router.catalog().len(),
            "Telegram: starting long-polling dispatcher"
        );

        let handler = Update::filter_message().endpoint(handle_message);

        Dispatcher::builder(self.bot, handler)
            .dependencies(dptree::deps![router])
            .default_handler(|_upd| async {})
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Telegram: dispatcher stopped");
    }
}

/// Commands shown in the Telegram client's menu.
///
/// `/ownerannouncement` is owner-only and stays unlisted.
pub fn bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Start over and clear the selected model"),
        BotCommand::new("models", "List the available models"),
        BotCommand::new("privacypolicy", "Show the privacy policy"),
    ]
}

async fn register_commands(bot: &Bot) -> Result<(), TelegramError> {
    bot.set_my_commands(bot_commands()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaybot_agent::pipeline::slash::BUILTIN_COMMANDS;

    #[test]
    fn menu_commands_are_builtin() {
        for cmd in bot_commands() {
            assert!(
                BUILTIN_COMMANDS.contains(&cmd.command.as_str()),
                "{} is not handled by the router",
                cmd.command
            );
        }
    }

    #[test]
    fn owner_command_not_advertised() {
        assert!(bot_commands()
            .iter()
            .all(|c| c.command != "ownerannouncement"));
    }
}
