//! Scripted [`DeepseekApi`]: password `secret`, verification code `123456`, and a fixed chat reply.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dbot_core::{Chat, Message, User};
use deepseek_client::{
    AccountUser, ApiError, ApiResult, ChatHandle, ChatStream, DeepseekApi, LoginData, StreamConfig,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeApi {
    pub reply_frames: Mutex<Vec<String>>,
    pub stream_calls: AtomicUsize,
    pub codes_requested: AtomicUsize,
    pub new_chats: AtomicUsize,
}

#[allow(dead_code)]
impl FakeApi {
    /// Streams `parts` as deltas followed by the end marker.
    pub fn replying(parts: &[&str]) -> Self {
        let mut frames: Vec<String> = parts
            .iter()
            .map(|p| {
                format!(
                    "data: {}\n\n",
                    serde_json::json!({"choices":[{"delta":{"content":p}}]})
                )
            })
            .collect();
        frames.push("data: [DONE]\n\n".to_string());
        Self {
            reply_frames: Mutex::new(frames),
            ..Self::default()
        }
    }

    pub fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeepseekApi for FakeApi {
    async fn login(&self, email: &str, password: &str) -> ApiResult<LoginData> {
        if password != "secret" {
            return Err(ApiError::Remote {
                code: 40003,
                message: "Invalid email or password".to_string(),
            });
        }
        Ok(LoginData {
            user: AccountUser {
                id: Some("acc".to_string()),
                email: Some(email.to_string()),
                token: "tok".to_string(),
            },
        })
    }

    async fn request_verification_code(&self, _email: &str) -> ApiResult<()> {
        self.codes_requested.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn register(&self, _email: &str, code: &str, _password: &str) -> ApiResult<()> {
        if code == "123456" {
            Ok(())
        } else {
            Err(ApiError::Remote {
                code: 40010,
                message: "Invalid verification code".to_string(),
            })
        }
    }

    async fn new_chat(&self, _token: &str) -> ApiResult<ChatHandle> {
        self.new_chats.fetch_add(1, Ordering::SeqCst);
        Ok(ChatHandle {
            message: "ok".to_string(),
        })
    }

    async fn stream_chat(&self, _message: &str, _token: &str) -> ApiResult<ChatStream> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        let frames = self.reply_frames.lock().unwrap().clone();
        Ok(ChatStream::from_chunks(
            frames.into_iter().map(Bytes::from),
            StreamConfig::default(),
        ))
    }
}

pub fn text_message(user_id: i64, content: &str) -> Message {
    Message {
        id: "1".to_string(),
        user: User {
            id: user_id,
            username: Some("dev".to_string()),
            first_name: Some("Dev".to_string()),
            last_name: None,
        },
        chat: Chat {
            id: 1000 + user_id,
            chat_type: "Private".to_string(),
        },
        content: content.to_string(),
        created_at: Utc::now(),
        reply_to: None,
    }
}
