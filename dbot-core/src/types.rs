//! Transport-neutral message model and the [`Handler`] contract of the chain.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    /// Transport's name for the chat kind, e.g. `Private(..)` or `Public(..)` for Telegram.
    pub chat_type: String,
}

/// The message a user replied to, as far as the transport exposes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRef {
    pub message_id: String,
    /// Sender of the replied-to message; `None` for channel posts and similar.
    pub user_id: Option<i64>,
    pub from_bot: bool,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An inbound text message. Non-text updates never reach the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub user: User,
    pub chat: Chat,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub reply_to: Option<ReplyRef>,
}

impl Message {
    /// Text starts with `/` (ignoring leading whitespace).
    pub fn is_command(&self) -> bool {
        self.content.trim_start().starts_with('/')
    }
}

/// What a handler did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResponse {
    /// Not mine; try the next handler.
    Continue,
    /// Claimed; nothing to report.
    Stop,
    /// Same as `Continue`, but says the handler looked and deliberately passed.
    Ignore,
    /// Claimed, with the text that was sent back; `after` hooks see it.
    Reply(String),
}

impl HandlerResponse {
    /// `Stop` and `Reply` end the handle phase.
    pub fn is_claimed(&self) -> bool {
        matches!(self, HandlerResponse::Stop | HandlerResponse::Reply(_))
    }
}

pub trait ToCoreUser: Send + Sync {
    fn to_core(&self) -> User;
}

pub trait ToCoreMessage: Send + Sync {
    fn to_core(&self) -> Message;
}

/// A link of the chain. All three phases are optional:
/// every `before` runs first (in order), then `handle` until one claims the message, then every
/// `after` in reverse order with the final response.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Return `false` to drop the message before any handler sees it.
    async fn before(&self, _message: &Message) -> Result<bool> {
        Ok(true)
    }

    async fn handle(&self, _message: &Message) -> Result<HandlerResponse> {
        Ok(HandlerResponse::Continue)
    }

    async fn after(&self, _message: &Message, _response: &HandlerResponse) -> Result<()> {
        Ok(())
    }
}
