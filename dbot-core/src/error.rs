use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbotError {
    #[error("Bot error: {0}")]
    Bot(String),

    /// Edit rejected because the new text equals what is already displayed.
    #[error("Bot error: message is not modified")]
    NotModified,

    /// Transport asked us to wait before the next call.
    #[error("Bot error: rate limited, retry after {}s", .0.as_secs())]
    RateLimited(Duration),
}

pub type Result<T> = std::result::Result<T, DbotError>;
