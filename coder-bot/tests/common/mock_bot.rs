//! Mock implementation of [`dbot_core::Bot`] that records replies, edits and typing calls.

use async_trait::async_trait;
use dbot_core::{Bot, Chat, Message, Result};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(dead_code)]
pub enum Call {
    Send(String),
    Edit(String),
    Typing(bool),
}

#[derive(Default)]
pub struct MockBot {
    calls: Mutex<Vec<Call>>,
}

#[allow(dead_code)]
impl MockBot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Texts of sent messages and replies, in order.
    pub fn sent(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Edit(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn typing(&self) -> Vec<bool> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Typing(on) => Some(on),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl Bot for MockBot {
    async fn send_message(&self, _chat: &Chat, text: &str) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Send(text.to_string()));
        Ok(())
    }

    async fn reply_to(&self, message: &Message, text: &str) -> Result<()> {
        self.send_message(&message.chat, text).await
    }

    async fn edit_message(&self, _chat: &Chat, _message_id: &str, text: &str) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Edit(text.to_string()));
        Ok(())
    }

    async fn send_message_and_return_id(&self, chat: &Chat, text: &str) -> Result<String> {
        self.send_message(chat, text).await?;
        Ok("500".to_string())
    }

    async fn send_typing(&self, _chat: &Chat, on: bool) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Typing(on));
        Ok(())
    }
}
