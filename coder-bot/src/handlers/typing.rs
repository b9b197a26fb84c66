//! Typing indicator around message handling. `/ping` answers instantly and is skipped.

use async_trait::async_trait;
use dbot_core::{Bot, Handler, HandlerResponse, Message, Result};
use std::sync::Arc;
use tracing::{debug, warn};

use super::CommandLine;

pub struct TypingHandler {
    bot: Arc<dyn Bot>,
}

impl TypingHandler {
    pub fn new(bot: Arc<dyn Bot>) -> Self {
        Self { bot }
    }

    fn wants_typing(message: &Message) -> bool {
        !message.content.trim().is_empty()
            && CommandLine::parse(&message.content).map_or(true, |line| line.name != "ping")
    }
}

#[async_trait]
impl Handler for TypingHandler {
    async fn before(&self, message: &Message) -> Result<bool> {
        if Self::wants_typing(message) {
            debug!(chat_id = message.chat.id, "typing on");
            if let Err(e) = self.bot.send_typing(&message.chat, true).await {
                warn!(error = %e, chat_id = message.chat.id, "Failed to send typing indicator");
            }
        }
        Ok(true)
    }

    async fn after(&self, message: &Message, _response: &HandlerResponse) -> Result<()> {
        if Self::wants_typing(message) {
            if let Err(e) = self.bot.send_typing(&message.chat, false).await {
                warn!(error = %e, chat_id = message.chat.id, "Failed to clear typing indicator");
            }
        }
        Ok(())
    }
}
