//! Classifying edit results.
//!
//! - **[`EditOutcome`]** – what an edit attempt did, as the relay loop's policy sees it.
//! - **[`classify_edit_error`]** – maps a gateway error to an outcome; "message is not modified" is [`EditOutcome::Unchanged`].

use dbot_core::DbotError;
use std::time::Duration;

/// Result of one edit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    /// The platform already shows this text.
    Unchanged,
    /// The platform asked to wait before the next edit.
    RateLimited(Duration),
    Failed(String),
}

/// True when the error text says the content is unchanged; some transports only report it as text.
pub fn is_message_not_modified_error(error: &str) -> bool {
    error.contains("message is not modified") || error.contains("exactly the same")
}

/// Parses "Retry after Ns" from an error string.
fn extract_retry_after_seconds(error: &str) -> Option<u64> {
    let pattern = "Retry after ";
    let start = error.find(pattern)? + pattern.len();
    let end = error[start..].find('s')?;
    error[start..start + end].trim().parse().ok()
}

pub fn classify_edit_error(error: &DbotError) -> EditOutcome {
    match error {
        DbotError::NotModified => EditOutcome::Unchanged,
        DbotError::RateLimited(wait) => EditOutcome::RateLimited(*wait),
        other => {
            let text = other.to_string();
            if is_message_not_modified_error(&text) {
                EditOutcome::Unchanged
            } else if let Some(secs) = extract_retry_after_seconds(&text) {
                EditOutcome::RateLimited(Duration::from_secs(secs))
            } else {
                EditOutcome::Failed(text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_errors_map_directly() {
        assert_eq!(classify_edit_error(&DbotError::NotModified), EditOutcome::Unchanged);
        assert_eq!(
            classify_edit_error(&DbotError::RateLimited(Duration::from_secs(4))),
            EditOutcome::RateLimited(Duration::from_secs(4))
        );
    }

    #[test]
    fn textual_not_modified_is_unchanged() {
        let err = DbotError::Bot(
            "Bad Request: message is not modified: specified new message content and reply markup are exactly the same".to_string(),
        );
        assert_eq!(classify_edit_error(&err), EditOutcome::Unchanged);
    }

    #[test]
    fn textual_retry_after_is_rate_limited() {
        let err = DbotError::Bot("Too Many Requests: Retry after 12s".to_string());
        assert_eq!(
            classify_edit_error(&err),
            EditOutcome::RateLimited(Duration::from_secs(12))
        );
    }

    #[test]
    fn anything_else_is_failed() {
        let err = DbotError::Bot("Bad Request: message to edit not found".to_string());
        assert!(matches!(classify_edit_error(&err), EditOutcome::Failed(_)));
        assert_eq!(extract_retry_after_seconds("Retry after xs"), None);
    }
}
