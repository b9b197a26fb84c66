//! Mock implementation of [`dbot_core::Bot`] for relay tests.
//!
//! Records every send and edit (with the paused-clock instant of each edit) and lets a test script
//! how the next edits fail, without hitting Telegram.

use async_trait::async_trait;
use dbot_core::{Bot, Chat, DbotError, Message, Result};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// How the next `edit_message` call behaves.
#[derive(Debug, Clone)]
#[allow(dead_code)] // not every test binary scripts every behavior
pub enum EditBehavior {
    Ok,
    NotModified,
    RateLimited(Duration),
    Fail(String),
}

/// One recorded call to `edit_message(chat, message_id, text)`.
#[derive(Debug, Clone)]
pub struct EditRecord {
    pub message_id: String,
    pub text: String,
    pub at: Instant,
}

/// Mock Bot: `send_message_and_return_id` hands out `"100"`, `"101"`, ...
#[derive(Default)]
pub struct MockBot {
    sent: Mutex<Vec<String>>,
    edits: Mutex<Vec<EditRecord>>,
    edit_script: Mutex<VecDeque<EditBehavior>>,
    /// Behavior once the script is exhausted.
    default_edit: Mutex<Option<EditBehavior>>,
    fail_placeholder: Mutex<bool>,
    next_id: Mutex<u32>,
}

#[allow(dead_code)]
impl MockBot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues behaviors for the next edits, in order.
    pub fn script_edits(&self, behaviors: Vec<EditBehavior>) {
        self.edit_script.lock().unwrap().extend(behaviors);
    }

    pub fn always_edit(&self, behavior: EditBehavior) {
        *self.default_edit.lock().unwrap() = Some(behavior);
    }

    pub fn fail_placeholder(&self) {
        *self.fail_placeholder.lock().unwrap() = true;
    }

    /// Texts of every sent message (placeholders included), in order.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn edits(&self) -> Vec<EditRecord> {
        self.edits.lock().unwrap().clone()
    }

    pub fn edit_texts(&self) -> Vec<String> {
        self.edits().into_iter().map(|e| e.text).collect()
    }

    /// Text of the last recorded edit. Rejected edits are never recorded.
    pub fn last_edit_text(&self) -> Option<String> {
        self.edits().last().map(|e| e.text.clone())
    }
}

#[async_trait]
impl Bot for MockBot {
    async fn send_message(&self, _chat: &Chat, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn reply_to(&self, message: &Message, text: &str) -> Result<()> {
        self.send_message(&message.chat, text).await
    }

    async fn edit_message(&self, _chat: &Chat, message_id: &str, text: &str) -> Result<()> {
        let behavior = self
            .edit_script
            .lock()
            .unwrap()
            .pop_front()
            .or_else(|| self.default_edit.lock().unwrap().clone())
            .unwrap_or(EditBehavior::Ok);
        match behavior {
            EditBehavior::Ok => {
                self.edits.lock().unwrap().push(EditRecord {
                    message_id: message_id.to_string(),
                    text: text.to_string(),
                    at: Instant::now(),
                });
                Ok(())
            }
            EditBehavior::NotModified => Err(DbotError::NotModified),
            EditBehavior::RateLimited(wait) => Err(DbotError::RateLimited(wait)),
            EditBehavior::Fail(reason) => Err(DbotError::Bot(reason)),
        }
    }

    async fn send_message_and_return_id(&self, _chat: &Chat, text: &str) -> Result<String> {
        if *self.fail_placeholder.lock().unwrap() {
            return Err(DbotError::Bot("Forbidden: bot was blocked by the user".to_string()));
        }
        self.sent.lock().unwrap().push(text.to_string());
        let mut next = self.next_id.lock().unwrap();
        let id = 100 + *next;
        *next += 1;
        Ok(id.to_string())
    }
}
