//! # Stream relay
//!
//! Forwards a user's message to Deepseek under their session and streams the reply back by editing a
//! single placeholder message. Edits are rate limited (minimum interval plus change detection);
//! "message is not modified" is swallowed and other edit failures never abort the stream.
//!
//! **Data flow:** [`StreamRelay::relay`] → session lookup → send placeholder → open [`deepseek_client::ChatStream`]
//! → append deltas to [`StreamState`] and edit when due → final edit, overflow, confirmation (or error notice).

mod config;
mod edit;
mod engine;
mod state;

pub use config::{RelayConfig, TELEGRAM_MAX_MESSAGE_CHARS};
pub use edit::{classify_edit_error, is_message_not_modified_error, EditOutcome};
pub use engine::{RelayError, RelayReport, Settled, StreamRelay};
pub use state::{prefix_chars, split_chunks, EditStats, StreamState};
