//! # handler-chain
//!
//! Ordered dispatch of one inbound message over a list of [`Handler`]s. The order of the list is
//! the routing precedence: the first handler whose `handle` returns `Stop` or `Reply` claims the
//! message and later handlers never see it.
//!
//! Phases per message:
//! 1. every `before`, first to last; `Ok(false)` drops the message. A failing hook is logged and skipped.
//! 2. `handle`, first to last, until one claims the message.
//! 3. every `after`, last to first, with the final response. Runs even when `handle` failed.

use dbot_core::{Handler, HandlerResponse, Message, Result};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
struct Route {
    name: String,
    handler: Arc<dyn Handler>,
}

/// Result of [`HandlerChain::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub response: HandlerResponse,
    /// Name of the handler that claimed the message (or whose `before` dropped it).
    pub claimed_by: Option<String>,
}

#[derive(Clone, Default)]
pub struct HandlerChain {
    routes: Vec<Route>,
}

/// Last path segment of `H`, e.g. `CommandHandler`.
fn short_type_name<H: ?Sized>() -> String {
    let full = std::any::type_name::<H>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

impl HandlerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler named after its type.
    pub fn add_handler<H: Handler + 'static>(self, handler: Arc<H>) -> Self {
        self.add_named(short_type_name::<H>(), handler)
    }

    pub fn add_named(mut self, name: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        self.routes.push(Route {
            name: name.into(),
            handler,
        });
        self
    }

    /// Handler names in routing order.
    pub fn names(&self) -> Vec<&str> {
        self.routes.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Dispatches and returns only the final response.
    pub async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        self.dispatch(message).await.map(|d| d.response)
    }

    /// Runs the three phases. An error from `handle` is returned after the `after` hooks ran.
    #[instrument(skip(self, message), fields(user_id = message.user.id, chat_id = message.chat.id, message_id = %message.id))]
    pub async fn dispatch(&self, message: &Message) -> Result<Dispatch> {
        info!("step: handler_chain started");

        for route in &self.routes {
            match route.handler.before(message).await {
                Ok(true) => {}
                Ok(false) => {
                    info!(handler = %route.name, "step: before dropped the message");
                    return Ok(Dispatch {
                        response: HandlerResponse::Stop,
                        claimed_by: Some(route.name.clone()),
                    });
                }
                Err(e) => warn!(handler = %route.name, error = %e, "before hook failed, continuing"),
            }
        }

        let mut outcome = Ok(Dispatch {
            response: HandlerResponse::Continue,
            claimed_by: None,
        });
        for route in &self.routes {
            match route.handler.handle(message).await {
                Ok(response) if response.is_claimed() => {
                    let reply_len = match &response {
                        HandlerResponse::Reply(text) => Some(text.len()),
                        _ => None,
                    };
                    info!(handler = %route.name, ?reply_len, "step: message claimed");
                    outcome = Ok(Dispatch {
                        response,
                        claimed_by: Some(route.name.clone()),
                    });
                    break;
                }
                Ok(response) => debug!(handler = %route.name, ?response, "passed"),
                Err(e) => {
                    warn!(handler = %route.name, error = %e, "step: handler failed");
                    outcome = Err(e);
                    break;
                }
            }
        }

        let final_response = match &outcome {
            Ok(dispatch) => dispatch.response.clone(),
            Err(_) => HandlerResponse::Stop,
        };
        for route in self.routes.iter().rev() {
            if let Err(e) = route.handler.after(message, &final_response).await {
                warn!(handler = %route.name, error = %e, "after hook failed");
            }
        }

        info!(
            claimed_by = ?outcome.as_ref().ok().and_then(|d| d.claimed_by.as_deref()),
            "step: handler_chain finished"
        );
        outcome
    }
}
