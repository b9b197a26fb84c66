//! Scripted [`DeepseekApi`] for relay tests: every login succeeds and every chat stream is built by
//! the closure the test installs.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dbot_core::{Chat, Message, User};
use deepseek_client::{
    AccountUser, ApiError, ApiResult, ChatHandle, ChatStream, DeepseekApi, LoginData, StreamConfig,
};
use session_store::SessionStore;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type StreamFactory = Box<dyn Fn() -> ApiResult<ChatStream> + Send + Sync>;

pub struct FakeApi {
    factory: StreamFactory,
    stream_calls: AtomicUsize,
    messages: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl FakeApi {
    pub fn new(factory: impl Fn() -> ApiResult<ChatStream> + Send + Sync + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            stream_calls: AtomicUsize::new(0),
            messages: Mutex::new(Vec::new()),
        }
    }

    /// Streams `body` in one chunk.
    pub fn with_body(body: impl Into<String>) -> Self {
        let body = body.into();
        Self::new(move || {
            Ok(ChatStream::from_chunks(
                vec![Bytes::from(body.clone())],
                StreamConfig::default(),
            ))
        })
    }

    pub fn failing(error: ApiError) -> Self {
        Self::new(move || Err(error.clone()))
    }

    pub fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeepseekApi for FakeApi {
    async fn login(&self, email: &str, _password: &str) -> ApiResult<LoginData> {
        Ok(LoginData {
            user: AccountUser {
                id: None,
                email: Some(email.to_string()),
                token: format!("token-for-{email}"),
            },
        })
    }

    async fn request_verification_code(&self, _email: &str) -> ApiResult<()> {
        Ok(())
    }

    async fn register(&self, _email: &str, _code: &str, _password: &str) -> ApiResult<()> {
        Ok(())
    }

    async fn new_chat(&self, _token: &str) -> ApiResult<ChatHandle> {
        Ok(ChatHandle {
            message: "ok".to_string(),
        })
    }

    async fn stream_chat(&self, message: &str, _token: &str) -> ApiResult<ChatStream> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        self.messages.lock().unwrap().push(message.to_string());
        (self.factory)()
    }
}

/// One `data:` frame carrying `content`.
pub fn data(content: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({"choices":[{"delta":{"content":content}}]})
    )
}

pub const DONE: &str = "data: [DONE]\n\n";

/// Store with user `user_id` already logged in.
pub async fn logged_in_store(api: Arc<FakeApi>, user_id: i64) -> Arc<SessionStore> {
    let store = Arc::new(SessionStore::new(api));
    store
        .login(user_id, "dev@example.com", "secret")
        .await
        .expect("fake login succeeds");
    store
}

pub fn incoming(user_id: i64, content: &str) -> Message {
    Message {
        id: "1".to_string(),
        user: User {
            id: user_id,
            username: Some("dev".to_string()),
            first_name: None,
            last_name: None,
        },
        chat: Chat {
            id: 42,
            chat_type: "Private".to_string(),
        },
        content: content.to_string(),
        created_at: Utc::now(),
        reply_to: None,
    }
}
