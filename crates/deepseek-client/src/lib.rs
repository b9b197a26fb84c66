//! # Deepseek Coder API client
//!
//! Account calls (login, register, verification code), conversation reset and streamed chat
//! completions. Streams are decoded line by line ([`frame`]) by a background pump ([`stream`]) that
//! feeds a bounded channel, so the consumer controls the pace and can cancel by dropping the stream.

mod client;
mod error;
pub mod frame;
pub mod stream;
mod types;

pub use client::{ClientConfig, DeepseekApi, DeepseekClient, DEFAULT_BASE_URL};
pub use error::{ApiError, ApiResult};
pub use stream::{ChatStream, StreamConfig, StreamItem};
pub use types::{AccountUser, ApiEnvelope, ChatEvent, ChatHandle, LoginData};

/// Masks a session token for safe logging: shows first 7 chars + "***" + last 4 chars.
/// If length <= 11, returns "***" to avoid leaking any part of the token.
pub fn mask_token(token: &str) -> String {
    let len = token.len();
    if len <= 11 || !token.is_char_boundary(7) || !token.is_char_boundary(len - 4) {
        return "***".to_string();
    }
    format!("{}***{}", &token[..7], &token[len - 4..])
}
