//! Wiring: config → Telegram bot, Deepseek client, session store, relay → handler chain → REPL.

use anyhow::{Context, Result};
use dbot_core::{init_tracing, Bot};
use dbot_telegram::{run_repl, TelegramBotAdapter};
use deepseek_client::{mask_token, DeepseekClient};
use handler_chain::HandlerChain;
use session_store::SessionStore;
use std::sync::Arc;
use stream_relay::{RelayConfig, StreamRelay};
use tracing::{info, instrument};

use crate::config::BotConfig;
use crate::handlers::{
    BotUsername, CommandHandler, RelayHandler, TypingHandler, UnknownCommandHandler,
};

/// Builds the chain in routing order: typing indicator, commands, unknown-command fallback, relay.
/// `seed` makes the unknown-command replies deterministic.
pub fn build_handler_chain(
    bot: Arc<dyn Bot>,
    sessions: Arc<SessionStore>,
    relay_config: RelayConfig,
    bot_username: BotUsername,
    seed: Option<u64>,
) -> HandlerChain {
    let relay = Arc::new(StreamRelay::new(bot.clone(), sessions.clone(), relay_config));
    let unknown = match seed {
        Some(seed) => UnknownCommandHandler::with_seed(bot.clone(), bot_username.clone(), seed),
        None => UnknownCommandHandler::new(bot.clone(), bot_username.clone()),
    };
    HandlerChain::new()
        .add_handler(Arc::new(TypingHandler::new(bot.clone())))
        .add_handler(Arc::new(CommandHandler::new(bot, sessions, bot_username)))
        .add_handler(Arc::new(unknown))
        .add_handler(Arc::new(RelayHandler::new(relay)))
}

/// Main entry: validate config, init logging, build components and handler chain, then run the REPL.
#[instrument(skip(config))]
pub async fn run_bot(config: BotConfig) -> Result<()> {
    config.validate()?;
    init_tracing(&config.log_file)?;

    info!(
        deepseek_api_url = %config.deepseek_api_url,
        telegram_api_url = ?config.telegram.telegram_api_url,
        bot_token = %mask_token(&config.telegram.bot_token),
        edit_interval_ms = config.relay.edit_interval.as_millis() as u64,
        "Initializing bot"
    );

    let teloxide_bot = config.telegram.build_bot();
    let bot: Arc<dyn Bot> = Arc::new(TelegramBotAdapter::new(teloxide_bot.clone()));
    let client = DeepseekClient::new(config.client_config())
        .context("Failed to build Deepseek API client")?;
    let sessions = Arc::new(SessionStore::new(Arc::new(client)));
    let bot_username: BotUsername = Arc::new(tokio::sync::RwLock::new(None));

    let handler_chain = build_handler_chain(
        bot,
        sessions,
        config.relay.clone(),
        bot_username.clone(),
        None,
    );

    info!("Bot started successfully");
    run_repl(teloxide_bot, handler_chain, bot_username).await?;

    Ok(())
}
