//! # coder-bot
//!
//! Telegram bot for Deepseek Coder: account commands (`/login`, `/register`, `/logout`, `/newchat`),
//! utility commands and a relay that streams Deepseek's answer into one progressively edited message.
//!
//! Routing is an ordered [`handler_chain::HandlerChain`]; see [`build_handler_chain`].

mod cli;
mod config;
mod handlers;
mod runner;

pub use cli::{load_config, Cli, Commands};
pub use config::BotConfig;
pub use handlers::{
    BotUsername, Command, CommandHandler, CommandLine, RelayHandler, TypingHandler,
    UnknownCommandHandler, UNKNOWN_COMMAND_RESPONSES,
};
pub use runner::{build_handler_chain, run_bot};
