//! Relay handler: any text that is not a command goes to Deepseek through [`StreamRelay`].

use async_trait::async_trait;
use dbot_core::{Handler, HandlerResponse, Message, Result};
use std::sync::Arc;
use stream_relay::StreamRelay;
use tracing::{info, instrument};

pub struct RelayHandler {
    relay: Arc<StreamRelay>,
}

impl RelayHandler {
    pub fn new(relay: Arc<StreamRelay>) -> Self {
        Self { relay }
    }
}

#[async_trait]
impl Handler for RelayHandler {
    /// Returns `Reply(full text)` on success so `after()` hooks see the answer; `Stop` otherwise.
    #[instrument(skip(self, message), fields(user_id = message.user.id, chat_id = message.chat.id))]
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        if message.content.trim().is_empty() {
            return Ok(HandlerResponse::Continue);
        }
        info!("step: RelayHandler relaying message");
        let report = self.relay.relay(message).await;
        if report.is_success() {
            Ok(HandlerResponse::Reply(report.text))
        } else {
            Ok(HandlerResponse::Stop)
        }
    }
}
