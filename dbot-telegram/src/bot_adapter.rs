//! Wraps teloxide::Bot and implements [`dbot_core::Bot`]. Production code sends messages via Telegram; tests can substitute another Bot impl.
//!
//! Telegram's "message is not modified" and "retry after" answers become [`DbotError::NotModified`]
//! and [`DbotError::RateLimited`] so the relay can tell them apart from real failures.

use async_trait::async_trait;
use dbot_core::{parse_message_id, Bot as CoreBot, Chat, DbotError, Message, Result};
use teloxide::types::{ChatAction, ChatId, MessageId};
use teloxide::{prelude::*, ApiError, RequestError};

/// Thin wrapper around teloxide::Bot that implements dbot-core's Bot trait.
pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
}

impl TelegramBotAdapter {
    /// Creates an adapter from an existing teloxide Bot.
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }

    /// Returns the underlying teloxide::Bot for direct API use when needed.
    pub fn inner(&self) -> &teloxide::Bot {
        &self.bot
    }
}

fn map_request_error(e: RequestError) -> DbotError {
    match e {
        RequestError::Api(ApiError::MessageNotModified) => DbotError::NotModified,
        RequestError::RetryAfter(secs) => DbotError::RateLimited(secs.duration()),
        other => DbotError::Bot(other.to_string()),
    }
}

#[async_trait]
impl CoreBot for TelegramBotAdapter {
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat.id), text.to_string())
            .await
            .map_err(map_request_error)?;
        Ok(())
    }

    async fn send_message_and_return_id(&self, chat: &Chat, text: &str) -> Result<String> {
        let sent = self
            .bot
            .send_message(ChatId(chat.id), text.to_string())
            .await
            .map_err(map_request_error)?;
        Ok(sent.id.to_string())
    }

    async fn reply_to(&self, message: &Message, text: &str) -> Result<()> {
        let mut request = self.bot.send_message(ChatId(message.chat.id), text.to_string());
        if let Ok(id) = parse_message_id(&message.id) {
            request = request.reply_parameters(teloxide::types::ReplyParameters::new(MessageId(id)));
        }
        request.await.map_err(map_request_error)?;
        Ok(())
    }

    async fn edit_message(&self, chat: &Chat, message_id: &str, text: &str) -> Result<()> {
        let id = parse_message_id(message_id)?;
        self.bot
            .edit_message_text(ChatId(chat.id), MessageId(id), text)
            .await
            .map_err(map_request_error)?;
        Ok(())
    }

    /// Telegram has no "stop typing"; the indicator expires on its own or when a message is sent.
    async fn send_typing(&self, chat: &Chat, on: bool) -> Result<()> {
        if !on {
            return Ok(());
        }
        self.bot
            .send_chat_action(ChatId(chat.id), ChatAction::Typing)
            .await
            .map_err(map_request_error)?;
        Ok(())
    }
}
