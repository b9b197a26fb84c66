use thiserror::Error;

/// Errors returned by the Deepseek API client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Transport failure (connect, TLS, broken body).
    #[error("network error: {0}")]
    Network(String),

    /// The API answered with a non-zero status code (or a non-2xx HTTP status).
    #[error("remote error {code}: {message}")]
    Remote { code: i64, message: String },

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// The chat stream produced too many malformed frames in a row.
    #[error("stream error: {0}")]
    Stream(String),

    #[error("request timed out")]
    Timeout,
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
