use std::time::Duration;

/// Telegram rejects messages longer than this.
pub const TELEGRAM_MAX_MESSAGE_CHARS: usize = 4096;

/// Policy and user-facing texts of a relay operation.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Minimum time between two edits of the placeholder.
    pub edit_interval: Duration,
    /// Longest wait for the stream to open or for its next event.
    pub stream_idle_timeout: Duration,
    /// Bound on every chat gateway call (send, edit).
    pub gateway_timeout: Duration,
    /// Longest text shown in one message; the rest is sent as follow-ups when the stream settles.
    pub max_message_chars: usize,
    pub placeholder_text: String,
    pub confirmation_text: String,
    pub not_logged_in_text: String,
    /// Shown in the placeholder when the stream ended without any content.
    pub empty_reply_text: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            edit_interval: Duration::from_millis(500),
            stream_idle_timeout: Duration::from_secs(120),
            gateway_timeout: Duration::from_secs(30),
            max_message_chars: TELEGRAM_MAX_MESSAGE_CHARS,
            placeholder_text: "Sending message to Deepseek Coder...".to_string(),
            confirmation_text: "Successfully sent message to Deepseek Coder".to_string(),
            not_logged_in_text:
                "You are not logged in. Please login using /login <email> <password>".to_string(),
            empty_reply_text: "Deepseek Coder returned an empty response.".to_string(),
        }
    }
}
