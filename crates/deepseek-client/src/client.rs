//! HTTP client for the Deepseek Coder API and the [`DeepseekApi`] seam used by the rest of the bot.

use crate::error::{ApiError, ApiResult};
use crate::stream::{ChatStream, StreamConfig};
use crate::types::{
    ApiEnvelope, ChatHandle, ChatRequest, LoginData, LoginRequest, NewChatRequest,
    RegisterPayload, RegisterRequest, VerificationCodeRequest,
};
use crate::mask_token;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, instrument, warn};

pub const DEFAULT_BASE_URL: &str = "https://coder.deepseek.com/api/v0";
const MODEL_CLASS: &str = "deepseek_code";
const LOCALE: &str = "en_US";

/// Remote chat API as seen by the session store and the relay. Tokens are borrowed per call.
#[async_trait]
pub trait DeepseekApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> ApiResult<LoginData>;
    /// Asks the API to e-mail a verification code.
    async fn request_verification_code(&self, email: &str) -> ApiResult<()>;
    async fn register(&self, email: &str, code: &str, password: &str) -> ApiResult<()>;
    /// Starts a fresh conversation (clears the remote context).
    async fn new_chat(&self, token: &str) -> ApiResult<ChatHandle>;
    /// Opens a streamed completion for `message`.
    async fn stream_chat(&self, message: &str, token: &str) -> ApiResult<ChatStream>;
}

/// Connection settings for [`DeepseekClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Timeout of non-streaming requests; streamed bodies are bounded by the relay instead.
    pub request_timeout: Duration,
    pub stream: StreamConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            stream: StreamConfig::default(),
        }
    }
}

/// reqwest-based implementation of [`DeepseekApi`].
#[derive(Clone)]
pub struct DeepseekClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl DeepseekClient {
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("coder-relay-bot/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    /// Builds a client with default settings against `base_url` (e.g. a mock server in tests).
    pub fn with_base_url(base_url: impl Into<String>) -> ApiResult<Self> {
        Self::new(ClientConfig {
            base_url: base_url.into(),
            ..ClientConfig::default()
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// POSTs `body` as JSON and returns the envelope when `code == 0`.
    async fn post_json<B, T>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> ApiResult<ApiEnvelope<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self
            .http
            .post(self.url(path))
            .timeout(self.config.request_timeout)
            .json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let envelope: ApiEnvelope<T> = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(ApiError::Remote {
                    code: i64::from(status.as_u16()),
                    message: truncate_body(&text),
                })
            }
            Err(e) => return Err(ApiError::Decode(format!("{path}: {e}"))),
        };
        if envelope.code != 0 {
            warn!(path, code = envelope.code, msg = %envelope.msg, "Deepseek API returned error code");
            return Err(ApiError::Remote {
                code: envelope.code,
                message: envelope.msg,
            });
        }
        Ok(envelope)
    }
}

fn truncate_body(text: &str) -> String {
    const LIMIT: usize = 200;
    let trimmed = text.trim();
    if trimmed.chars().count() <= LIMIT {
        trimmed.to_string()
    } else {
        format!("{}…", trimmed.chars().take(LIMIT).collect::<String>())
    }
}

#[async_trait]
impl DeepseekApi for DeepseekClient {
    #[instrument(skip(self, password))]
    async fn login(&self, email: &str, password: &str) -> ApiResult<LoginData> {
        let body = LoginRequest {
            email,
            mobile: "",
            password,
            area_code: "",
        };
        let envelope: ApiEnvelope<LoginData> = self.post_json("users/login", None, &body).await?;
        let data = envelope
            .data
            .ok_or_else(|| ApiError::Decode("users/login: missing data".to_string()))?;
        info!(token = %mask_token(&data.user.token), "Deepseek login succeeded");
        Ok(data)
    }

    #[instrument(skip(self))]
    async fn request_verification_code(&self, email: &str) -> ApiResult<()> {
        let body = VerificationCodeRequest {
            email,
            locale: LOCALE,
        };
        let _: ApiEnvelope<serde_json::Value> = self
            .post_json("users/create_email_verification_code", None, &body)
            .await?;
        info!("Deepseek verification code requested");
        Ok(())
    }

    #[instrument(skip(self, code, password))]
    async fn register(&self, email: &str, code: &str, password: &str) -> ApiResult<()> {
        let body = RegisterRequest {
            email,
            email_verification_code: code,
            password,
            region: "US",
            locale: LOCALE,
            payload: RegisterPayload {
                invitation_code: String::new(),
            },
        };
        let _: ApiEnvelope<serde_json::Value> =
            self.post_json("users/register", None, &body).await?;
        info!("Deepseek registration completed");
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn new_chat(&self, token: &str) -> ApiResult<ChatHandle> {
        info!(token = %mask_token(token), "Deepseek new_chat request");
        let body = NewChatRequest {
            model_class: MODEL_CLASS,
            append_welcome_message: false,
        };
        let envelope: ApiEnvelope<serde_json::Value> =
            self.post_json("chat/clear_context", Some(token), &body).await?;
        Ok(ChatHandle {
            message: envelope.msg,
        })
    }

    #[instrument(skip(self, message, token), fields(message_len = message.len()))]
    async fn stream_chat(&self, message: &str, token: &str) -> ApiResult<ChatStream> {
        info!(token = %mask_token(token), "Deepseek stream_chat request");
        let body = ChatRequest {
            message,
            stream: true,
            model_preference: None,
            model_class: MODEL_CLASS,
            temperature: 0.0,
        };
        let response = self
            .http
            .post(self.url("chat/completions"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));

        // Errors (e.g. expired token) come back as a plain JSON envelope instead of a stream.
        if !status.is_success() || is_json {
            let text = response.text().await?;
            return match serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&text) {
                Ok(env) if env.code != 0 => Err(ApiError::Remote {
                    code: env.code,
                    message: env.msg,
                }),
                _ if !status.is_success() => Err(ApiError::Remote {
                    code: i64::from(status.as_u16()),
                    message: truncate_body(&text),
                }),
                _ => Ok(ChatStream::from_chunks(
                    vec![bytes::Bytes::from(text)],
                    self.config.stream,
                )),
            };
        }

        Ok(ChatStream::spawn(response.bytes_stream(), self.config.stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let client = DeepseekClient::with_base_url("http://localhost:1234/api/v0/").unwrap();
        assert_eq!(
            client.url("users/login"),
            "http://localhost:1234/api/v0/users/login"
        );
    }

    #[test]
    fn truncate_body_caps_long_bodies() {
        let long = "x".repeat(500);
        let out = truncate_body(&long);
        assert_eq!(out.chars().count(), 201);
        assert!(out.ends_with('…'));
        assert_eq!(truncate_body("  short \n"), "short");
    }
}
