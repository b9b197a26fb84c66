//! Outbound side of the chat gateway.
//!
//! [`Bot`] knows nothing about Telegram; dbot-telegram implements it with teloxide and tests use
//! recording mocks. Edit rejections come back as typed [`DbotError`] variants so the relay can
//! treat "not modified" and "slow down" differently from real failures.

use crate::error::{DbotError, Result};
use crate::types::{Chat, Message};
use async_trait::async_trait;

#[async_trait]
pub trait Bot: Send + Sync {
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()>;

    /// Answers `message` in its chat; transports may quote the original.
    async fn reply_to(&self, message: &Message, text: &str) -> Result<()>;

    /// Replaces the text of a message this bot sent earlier.
    ///
    /// Fails with [`DbotError::NotModified`] when `text` is what the chat already shows and with
    /// [`DbotError::RateLimited`] when the transport wants the caller to back off.
    async fn edit_message(&self, chat: &Chat, message_id: &str, text: &str) -> Result<()>;

    /// Sends `text` and returns the id to pass to [`Bot::edit_message`] later.
    async fn send_message_and_return_id(&self, chat: &Chat, text: &str) -> Result<String>;

    /// Shows (`on`) or clears the "typing..." status. No-op unless the transport supports it.
    async fn send_typing(&self, _chat: &Chat, _on: bool) -> Result<()> {
        Ok(())
    }
}

/// Message ids travel as strings; Telegram's are `i32`.
pub fn parse_message_id(s: &str) -> Result<i32> {
    s.trim()
        .parse()
        .map_err(|_| DbotError::Bot(format!("Invalid message_id for edit: {}", s)))
}
