//! Streamed response state: accumulated text, what the platform currently shows, and when the next
//! edit is allowed.

use crate::edit::EditOutcome;
use std::time::Duration;
use tokio::time::Instant;

/// Counters reported when a relay settles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditStats {
    pub applied: usize,
    pub unchanged: usize,
    pub rate_limited: usize,
    pub failed: usize,
}

/// Mutable state of one relay operation. The buffer is append-only; the displayed text is always a
/// prefix of it, so what the user sees never shrinks.
#[derive(Debug)]
pub struct StreamState {
    buffer: String,
    displayed: String,
    next_edit_at: Instant,
    edit_interval: Duration,
    max_chars: usize,
    pub stats: EditStats,
    pub last_edit_error: Option<String>,
    /// The remote sent its end marker (as opposed to just closing the connection).
    pub end_marker_seen: bool,
}

impl StreamState {
    pub fn new(edit_interval: Duration, max_chars: usize) -> Self {
        Self {
            buffer: String::new(),
            displayed: String::new(),
            next_edit_at: Instant::now(),
            edit_interval,
            max_chars: max_chars.max(1),
            stats: EditStats::default(),
            last_edit_error: None,
            end_marker_seen: false,
        }
    }

    pub fn push(&mut self, fragment: &str) {
        self.buffer.push_str(fragment);
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn displayed(&self) -> &str {
        &self.displayed
    }

    /// Text for the placeholder: the buffer capped at the message limit.
    pub fn display_text(&self) -> &str {
        prefix_chars(&self.buffer, self.max_chars)
    }

    /// Part of the display text the placeholder does not show yet.
    pub fn undisplayed(&self) -> &str {
        let shown = if self.display_text().starts_with(self.displayed.as_str()) {
            self.displayed.len()
        } else {
            0
        };
        &self.display_text()[shown..]
    }

    /// Text that did not fit into the placeholder.
    pub fn overflow(&self) -> &str {
        &self.buffer[self.display_text().len()..]
    }

    /// The display text differs from what is shown. Whitespace at the ends is ignored because the
    /// platform trims it, and whitespace-only text cannot be sent at all.
    pub fn has_pending(&self) -> bool {
        let next = self.display_text().trim();
        !next.is_empty() && next != self.displayed.trim()
    }

    /// When the pending text may be flushed, or `None` if nothing is pending.
    pub fn flush_deadline(&self) -> Option<Instant> {
        self.has_pending().then_some(self.next_edit_at)
    }

    pub fn edit_due(&self, now: Instant) -> bool {
        self.has_pending() && now >= self.next_edit_at
    }

    pub fn next_edit_at(&self) -> Instant {
        self.next_edit_at
    }

    /// Applies the outcome of editing the placeholder to `text` at `now`.
    pub fn record(&mut self, outcome: EditOutcome, text: &str, now: Instant) {
        match outcome {
            EditOutcome::Applied => {
                self.stats.applied += 1;
                self.displayed = text.to_string();
                self.next_edit_at = now + self.edit_interval;
            }
            EditOutcome::Unchanged => {
                self.stats.unchanged += 1;
                self.displayed = text.to_string();
                self.next_edit_at = now + self.edit_interval;
            }
            EditOutcome::RateLimited(wait) => {
                self.stats.rate_limited += 1;
                self.next_edit_at = now + wait.max(self.edit_interval);
            }
            EditOutcome::Failed(reason) => {
                self.stats.failed += 1;
                self.last_edit_error = Some(reason);
                self.next_edit_at = now + self.edit_interval;
            }
        }
    }
}

/// Longest prefix of `s` with at most `max` chars.
pub fn prefix_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Splits `s` into pieces of at most `max` chars, preferring to break after a newline.
pub fn split_chunks(s: &str, max: usize) -> Vec<&str> {
    let max = max.max(1);
    let mut chunks = Vec::new();
    let mut rest = s;
    while !rest.is_empty() {
        let head = prefix_chars(rest, max);
        let cut = if head.len() == rest.len() {
            head.len()
        } else {
            match head.rfind('\n') {
                Some(pos) if pos > 0 => pos + 1,
                _ => head.len(),
            }
        };
        chunks.push(&rest[..cut]);
        rest = &rest[cut..];
    }
    chunks
}
