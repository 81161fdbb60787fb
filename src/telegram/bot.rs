//! Bot initialization and command definitions
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation
//! - Registration of the command list shown in Telegram UI

use secrecy::ExposeSecret;
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use teloxide::utils::command::BotCommands;

use crate::core::config;

/// Bot commands enum with descriptions.
///
/// Everything except `/start` is operator-only; handlers ignore other senders.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "snake_case", description = "Commands:")]
pub enum Command {
    #[command(description = "open the store / abrir a loja")]
    Start,
    #[command(description = "list recent orders, optionally by status (operator)")]
    Orders(String),
    #[command(description = "show one order (operator)")]
    Order(String),
    #[command(description = "abort pending link entry (operator)")]
    Cancel,
    #[command(description = "run the release check now (operator)")]
    ReleaseCheck,
}

/// Creates a Bot instance with the configured token and request timeout
///
/// A custom Bot API server can be set with `BOT_API_URL`.
pub fn create_bot() -> anyhow::Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(config::network::timeout())
        .build()?;
    let bot = Bot::with_client(config::BOT_TOKEN.expose_secret(), client);

    let bot = if let Ok(bot_api_url) = std::env::var("BOT_API_URL") {
        log::info!("Using custom Bot API URL: {}", bot_api_url);
        let url = url::Url::parse(&bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
        bot.set_api_url(url)
    } else {
        bot
    };

    Ok(bot)
}

/// Sets up bot commands in Telegram UI.
///
/// Only `/start` is advertised; operator commands stay hidden.
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(vec![BotCommand::new("start", "abrir a loja / open the store")])
        .await?;

    Ok(())
}
