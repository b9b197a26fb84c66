//! Handlers of the coder bot chain, in routing order: typing indicator, commands, unknown-command
//! fallback, relay.

mod commands;
mod relay;
mod typing;
mod unknown;

pub use commands::{Command, CommandHandler};
pub use relay::RelayHandler;
pub use typing::TypingHandler;
pub use unknown::{UnknownCommandHandler, UNKNOWN_COMMAND_RESPONSES};

use std::sync::Arc;
use tokio::sync::RwLock;

/// Bot username learned from `get_me()`; `None` until the REPL starts.
pub type BotUsername = Arc<RwLock<Option<String>>>;

/// A `/word[@bot] args...` line split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine<'a> {
    pub name: String,
    pub target: Option<&'a str>,
    pub args: Vec<&'a str>,
}

impl<'a> CommandLine<'a> {
    /// Parses text that starts with `/`. The name is lower-cased; arguments keep their case.
    pub fn parse(text: &'a str) -> Option<Self> {
        let mut words = text.split_whitespace();
        let head = words.next()?.strip_prefix('/')?;
        if head.is_empty() {
            return None;
        }
        let (name, target) = match head.split_once('@') {
            Some((name, target)) => (name, Some(target)),
            None => (head, None),
        };
        Some(Self {
            name: name.to_ascii_lowercase(),
            target,
            args: words.collect(),
        })
    }

    /// A command without `@target` is for every bot; `/cmd@other_bot` is not for us.
    pub fn is_addressed_to(&self, bot_username: Option<&str>) -> bool {
        match (self.target, bot_username) {
            (None, _) => true,
            (Some(target), Some(me)) => target.eq_ignore_ascii_case(me),
            (Some(_), None) => true,
        }
    }
}
