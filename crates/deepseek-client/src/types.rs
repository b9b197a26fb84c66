//! Request and response bodies of the Deepseek Coder API.

use serde::{Deserialize, Deserializer, Serialize};

/// Every non-streaming endpoint answers `{code, msg, data}`; `code == 0` means success.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

/// `data` of a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub user: AccountUser,
}

/// Account returned by login; only `token` is required for later calls.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountUser {
    /// Sent as a string or a number depending on the API version.
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub token: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Id>::deserialize(deserializer)?.map(|id| match id {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    }))
}

/// Acknowledgement of a new conversation (the remote context was cleared).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatHandle {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub mobile: &'a str,
    pub password: &'a str,
    pub area_code: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct VerificationCodeRequest<'a> {
    pub email: &'a str,
    pub locale: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub email: &'a str,
    pub email_verification_code: &'a str,
    pub password: &'a str,
    pub region: &'a str,
    pub locale: &'a str,
    pub payload: RegisterPayload,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterPayload {
    pub invitation_code: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewChatRequest<'a> {
    pub model_class: &'a str,
    pub append_welcome_message: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub message: &'a str,
    pub stream: bool,
    pub model_preference: Option<String>,
    pub model_class: &'a str,
    pub temperature: f32,
}

/// One decoded `data:` payload of the chat stream.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChunk {
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Option<ChunkDelta>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

/// What the relay sees from a chat stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// Incremental content fragment.
    Delta(String),
    /// The remote signalled the end of the response.
    Done,
}
