//! Fallback for `/commands` nobody handled: replies with a random line.

use async_trait::async_trait;
use dbot_core::{Bot, Handler, HandlerResponse, Message, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use super::{BotUsername, CommandLine};

pub const UNKNOWN_COMMAND_RESPONSES: [&str; 12] = [
    "I don't know that command",
    "What?",
    "Excuse me?",
    "I don't understand",
    "What are you talking about?",
    "I don't know what you mean",
    "I don't know what to say",
    "Go away",
    "Fall in a hole",
    "I don't care",
    "I'm not listening",
    "Are you talking to me?",
];

pub struct UnknownCommandHandler {
    bot: Arc<dyn Bot>,
    bot_username: BotUsername,
    rng: Mutex<StdRng>,
}

impl UnknownCommandHandler {
    pub fn new(bot: Arc<dyn Bot>, bot_username: BotUsername) -> Self {
        Self::with_rng(bot, bot_username, StdRng::from_entropy())
    }

    /// Deterministic choice sequence, for tests.
    pub fn with_seed(bot: Arc<dyn Bot>, bot_username: BotUsername, seed: u64) -> Self {
        Self::with_rng(bot, bot_username, StdRng::seed_from_u64(seed))
    }

    fn with_rng(bot: Arc<dyn Bot>, bot_username: BotUsername, rng: StdRng) -> Self {
        Self {
            bot,
            bot_username,
            rng: Mutex::new(rng),
        }
    }

    fn pick(&self) -> &'static str {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        UNKNOWN_COMMAND_RESPONSES
            .choose(&mut *rng)
            .copied()
            .unwrap_or(UNKNOWN_COMMAND_RESPONSES[0])
    }
}

#[async_trait]
impl Handler for UnknownCommandHandler {
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        if !message.is_command() {
            return Ok(HandlerResponse::Continue);
        }
        // A bare "/" or "/ text" has no command word but is still a command.
        let line = CommandLine::parse(&message.content);
        if let Some(line) = &line {
            let me = self.bot_username.read().await.clone();
            if !line.is_addressed_to(me.as_deref()) {
                return Ok(HandlerResponse::Stop);
            }
        }
        let command = line.as_ref().map(|l| l.name.as_str()).unwrap_or("");
        info!(user_id = message.user.id, command, "step: unknown command");
        let text = self.pick();
        if let Err(e) = self.bot.reply_to(message, text).await {
            warn!(error = %e, "Failed to reply to unknown command");
        }
        Ok(HandlerResponse::Reply(text.to_string()))
    }
}
