//! Relay engine: placeholder → stream → rate-limited edits → settle.
//!
//! # Entry points
//!
//! - **[`StreamRelay::relay`]** – Runs one relay operation for an inbound message and returns a [`RelayReport`].
//!
//! Every operation ends in exactly one of: a success confirmation, or an error notice. Edits are
//! issued sequentially in accumulation order and never shrink the displayed text.

use crate::config::RelayConfig;
use crate::edit::{classify_edit_error, EditOutcome};
use crate::state::{split_chunks, StreamState};
use dbot_core::{Bot, Chat, Message};
use deepseek_client::{ApiError, ChatEvent, ChatStream};
use session_store::SessionStore;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::time::{sleep_until, timeout, Instant};
use tracing::{debug, error, info, instrument, warn};

/// Why a relay operation settled with an error.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("not logged in")]
    NotLoggedIn,

    /// Sending the placeholder or a notice failed.
    #[error("chat gateway error: {0}")]
    Gateway(String),

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
}

/// Terminal state of a relay operation.
#[derive(Debug)]
pub enum Settled {
    Success,
    Error(RelayError),
}

/// What happened during one relay operation.
#[derive(Debug)]
pub struct RelayReport {
    pub outcome: Settled,
    pub placeholder_id: Option<String>,
    /// Full accumulated reply text.
    pub text: String,
    pub stats: crate::state::EditStats,
}

impl RelayReport {
    fn settled(outcome: Settled) -> Self {
        Self {
            outcome,
            placeholder_id: None,
            text: String::new(),
            stats: Default::default(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Settled::Success)
    }
}

/// Identifies which message we are editing; bundles bot, chat, and message ID.
struct EditTarget<'a> {
    bot: &'a Arc<dyn Bot>,
    chat: &'a Chat,
    message_id: &'a str,
}

/// Relays Deepseek replies into chat messages. Cheap to share; holds no per-operation state.
pub struct StreamRelay {
    bot: Arc<dyn Bot>,
    sessions: Arc<SessionStore>,
    config: RelayConfig,
}

impl StreamRelay {
    pub fn new(bot: Arc<dyn Bot>, sessions: Arc<SessionStore>, config: RelayConfig) -> Self {
        Self {
            bot,
            sessions,
            config,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// **Entry point.** Relays `message.content` for `message.user` and edits a placeholder with the streamed reply.
    #[instrument(skip(self, message), fields(user_id = message.user.id, chat_id = message.chat.id))]
    pub async fn relay(&self, message: &Message) -> RelayReport {
        let chat = &message.chat;

        let Some(session) = self.sessions.get(message.user.id) else {
            info!("relay: no session, not opening a stream");
            if let Err(e) = self
                .gateway("not-logged-in notice", self.bot.send_message(chat, &self.config.not_logged_in_text))
                .await
            {
                error!(error = %e, "Failed to send not-logged-in notice");
            }
            return RelayReport::settled(Settled::Error(RelayError::NotLoggedIn));
        };

        let message_id = match self
            .gateway(
                "placeholder",
                self.bot
                    .send_message_and_return_id(chat, &self.config.placeholder_text),
            )
            .await
        {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "Failed to send placeholder");
                self.notify(chat, &format!("Error: {e}")).await;
                return RelayReport::settled(Settled::Error(e));
            }
        };
        let target = EditTarget {
            bot: &self.bot,
            chat,
            message_id: &message_id,
        };
        let mut state = StreamState::new(self.config.edit_interval, self.config.max_message_chars);

        let opened = timeout(
            self.config.stream_idle_timeout,
            self.sessions
                .api()
                .stream_chat(&message.content, &session.token),
        )
        .await;
        let result = match opened {
            Ok(Ok(mut stream)) => {
                info!(message_id = %message_id, "relay: streaming");
                self.drain(&mut stream, &mut state, &target).await
            }
            Ok(Err(e)) => Err(RelayError::Api(e)),
            Err(_) => Err(RelayError::Timeout("the chat stream to open")),
        };

        let outcome = match result {
            Ok(()) => self.settle_success(&mut state, &target).await,
            Err(e) => self.settle_error(e, &mut state, &target).await,
        };
        info!(
            success = matches!(outcome, Settled::Success),
            reply_len = state.buffer().len(),
            edits = ?state.stats,
            end_marker = state.end_marker_seen,
            "relay: settled"
        );
        RelayReport {
            outcome,
            placeholder_id: Some(message_id),
            text: state.buffer().to_string(),
            stats: state.stats.clone(),
        }
    }

    /// Consumes the stream until the end marker, closure, a fatal error, or the idle timeout.
    ///
    /// The idle deadline moves only when the stream yields; flushing pending text does not extend it.
    async fn drain(
        &self,
        stream: &mut ChatStream,
        state: &mut StreamState,
        target: &EditTarget<'_>,
    ) -> Result<(), RelayError> {
        let idle = self.config.stream_idle_timeout;
        let mut idle_deadline = Instant::now() + idle;
        loop {
            let flush_at = state.flush_deadline();
            tokio::select! {
                next = stream.next() => {
                    idle_deadline = Instant::now() + idle;
                    match next {
                        None => return Ok(()),
                        Some(Ok(ChatEvent::Done)) => {
                            state.end_marker_seen = true;
                            return Ok(());
                        }
                        Some(Ok(ChatEvent::Delta(fragment))) => {
                            state.push(&fragment);
                            if state.edit_due(Instant::now()) {
                                self.edit(state, target).await;
                            }
                        }
                        Some(Err(e)) => return Err(RelayError::Api(e)),
                    }
                }
                _ = sleep_until(idle_deadline) => {
                    return Err(RelayError::Timeout("the next chunk of the reply"));
                }
                _ = sleep_until_opt(flush_at) => {
                    // Deltas stopped arriving while a change is pending.
                    self.edit(state, target).await;
                }
            }
        }
    }

    /// Edits the target to the current display text and records the outcome.
    async fn edit(&self, state: &mut StreamState, target: &EditTarget<'_>) {
        let text = state.display_text().to_string();
        let outcome = match timeout(
            self.config.gateway_timeout,
            target.bot.edit_message(target.chat, target.message_id, &text),
        )
        .await
        {
            Ok(Ok(())) => EditOutcome::Applied,
            Ok(Err(e)) => classify_edit_error(&e),
            Err(_) => EditOutcome::Failed("edit timed out".to_string()),
        };
        match &outcome {
            EditOutcome::Applied | EditOutcome::Unchanged => {
                debug!(len = text.len(), ?outcome, "relay: edit")
            }
            EditOutcome::RateLimited(wait) => {
                warn!(wait_secs = wait.as_secs(), "relay: edit rate limited")
            }
            EditOutcome::Failed(reason) => warn!(reason = %reason, "relay: edit failed"),
        }
        state.record(outcome, &text, Instant::now());
    }

    /// Shows the final text (waiting out the edit interval), sends overflow and the confirmation.
    async fn settle_success(&self, state: &mut StreamState, target: &EditTarget<'_>) -> Settled {
        if state.buffer().trim().is_empty() {
            let notice = self.config.empty_reply_text.clone();
            self.show_notice(target, &notice).await;
        } else if state.has_pending() {
            // Waits for the edit window at most `gateway_timeout`; a longer retry-after is not awaited.
            let give_up_at = Instant::now() + self.config.gateway_timeout;
            for _ in 0..2 {
                if !state.has_pending() || state.next_edit_at() > give_up_at {
                    break;
                }
                sleep_until(state.next_edit_at()).await;
                self.edit(state, target).await;
            }
            if state.has_pending() {
                let rest = state.undisplayed().to_string();
                warn!(
                    rest_len = rest.len(),
                    "relay: final edit not possible, sending the rest as a new message"
                );
                if let Err(e) = self
                    .gateway("follow-up message", target.bot.send_message(target.chat, &rest))
                    .await
                {
                    error!(error = %e, "Failed to send the rest of the reply");
                    return Settled::Error(e);
                }
            }
        }

        for chunk in split_chunks(state.overflow(), self.config.max_message_chars) {
            if chunk.trim().is_empty() {
                continue;
            }
            if let Err(e) = self
                .gateway("overflow message", target.bot.send_message(target.chat, chunk))
                .await
            {
                error!(error = %e, "Failed to send overflow chunk");
                return Settled::Error(e);
            }
        }

        match self
            .gateway(
                "confirmation",
                target
                    .bot
                    .send_message(target.chat, &self.config.confirmation_text),
            )
            .await
        {
            Ok(()) => Settled::Success,
            Err(e) => {
                error!(error = %e, "Failed to send confirmation");
                Settled::Error(e)
            }
        }
    }

    /// Reports `err`: in the placeholder when nothing was shown yet, otherwise as a new message.
    async fn settle_error(
        &self,
        err: RelayError,
        state: &mut StreamState,
        target: &EditTarget<'_>,
    ) -> Settled {
        error!(error = %err, "relay: failed");
        if state.edit_due(Instant::now()) {
            self.edit(state, target).await;
        }
        let notice = format!("Error: {err}");
        if state.displayed().trim().is_empty() {
            self.show_notice(target, &notice).await;
        } else {
            self.notify(target.chat, &notice).await;
        }
        Settled::Error(err)
    }

    /// Replaces the placeholder with `text`, falling back to a new message.
    async fn show_notice(&self, target: &EditTarget<'_>, text: &str) {
        let edited = timeout(
            self.config.gateway_timeout,
            target.bot.edit_message(target.chat, target.message_id, text),
        )
        .await;
        match edited {
            Ok(Ok(())) => {}
            Ok(Err(e)) if classify_edit_error(&e) == EditOutcome::Unchanged => {}
            _ => self.notify(target.chat, text).await,
        }
    }

    /// Best-effort message; failures are only logged.
    async fn notify(&self, chat: &Chat, text: &str) {
        if let Err(e) = self.gateway("notice", self.bot.send_message(chat, text)).await {
            error!(error = %e, "Failed to send notice");
        }
    }

    async fn gateway<T>(
        &self,
        what: &'static str,
        call: impl Future<Output = dbot_core::Result<T>>,
    ) -> Result<T, RelayError> {
        match timeout(self.config.gateway_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(RelayError::Gateway(e.to_string())),
            Err(_) => Err(RelayError::Timeout(what)),
        }
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
