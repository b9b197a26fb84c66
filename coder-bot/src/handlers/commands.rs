//! Explicit commands: `/start`, `/help`, `/ping`, `/info`, `/msginfo` and the account commands
//! backed by [`SessionStore`].
//!
//! A command matches on the exact command word, optionally suffixed with `@botname`. Anything else
//! (including unknown `/words`) is passed on with `Continue`.

use async_trait::async_trait;
use dbot_core::{Bot, Handler, HandlerResponse, Message, Result};
use session_store::{RegisterOutcome, SessionError, SessionStore};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{BotUsername, CommandLine};

const WELCOME_TEXT: &str = "Welcome to TG-BOT";
const HELP_TEXT: &str = "Help

Available Commands:
/start - Check if bot alive
/help - Show this help message
/ping - Check ping status
/info - Show your ID (or the replied-to user's) and the chat ID
/msginfo - Show details of the replied-to message

Deepseek Coder
/register - Register your account at Deepseek Coder
/login - Login to your account at Deepseek Coder
/logout - Logout from Deepseek Coder
/newchat - Create a new chat conversation

Send any message to receive response from Deepseek Coder";
const LOGIN_USAGE: &str = "Please provide email and password. /login <email> <password>";
const REGISTER_USAGE: &str = "Please provide email and password. /register email password";
const VERIFICATION_SENT: &str = "Email verification code sent to your email. Please check your email and run /register email password verification_code";
const REGISTERED: &str = "Successfully registered. Now login using /login <email> <password>";
const MANUAL_SIGNUP_URL: &str = "https://coder.deepseek.com";
const NOT_LOGGED_IN_HINT: &str = "You are not logged in. Please login using /login <email> <password>";
const MSGINFO_HINT: &str = "Reply to a message to get details";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Ping,
    Info,
    MsgInfo,
    Login,
    Register,
    Logout,
    NewChat,
}

impl Command {
    /// Exact match on the (lower-cased) command word.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "ping" => Some(Self::Ping),
            "info" => Some(Self::Info),
            "msginfo" => Some(Self::MsgInfo),
            "login" => Some(Self::Login),
            "register" => Some(Self::Register),
            "logout" => Some(Self::Logout),
            "newchat" => Some(Self::NewChat),
            _ => None,
        }
    }
}

pub struct CommandHandler {
    bot: Arc<dyn Bot>,
    sessions: Arc<SessionStore>,
    bot_username: BotUsername,
}

impl CommandHandler {
    pub fn new(bot: Arc<dyn Bot>, sessions: Arc<SessionStore>, bot_username: BotUsername) -> Self {
        Self {
            bot,
            sessions,
            bot_username,
        }
    }

    /// Runs `command` and returns the reply text.
    async fn execute(&self, command: Command, args: &[&str], message: &Message) -> String {
        let user_id = message.user.id;
        match command {
            Command::Start => WELCOME_TEXT.to_string(),
            Command::Help => HELP_TEXT.to_string(),
            Command::Ping => "Pong".to_string(),
            Command::Info => info_text(message),
            Command::MsgInfo => msginfo_text(message),
            Command::Login => match args {
                [email, password] => match self.sessions.login(user_id, email, password).await {
                    Ok(_) => "Successfully logged in".to_string(),
                    Err(SessionError::AlreadyLoggedIn) => SessionError::AlreadyLoggedIn.to_string(),
                    Err(e) => format!("Error: {e}"),
                },
                _ if self.sessions.is_logged_in(user_id) => {
                    SessionError::AlreadyLoggedIn.to_string()
                }
                _ => LOGIN_USAGE.to_string(),
            },
            Command::Register => {
                let (email, password, code) = match args {
                    [email, password] => (*email, *password, None),
                    [email, password, code, ..] => (*email, *password, Some(*code)),
                    _ if self.sessions.is_logged_in(user_id) => {
                        return SessionError::AlreadyLoggedIn.to_string()
                    }
                    _ => return REGISTER_USAGE.to_string(),
                };
                match self.sessions.register(user_id, email, password, code).await {
                    Ok(RegisterOutcome::VerificationPending) => VERIFICATION_SENT.to_string(),
                    Ok(RegisterOutcome::Registered) => REGISTERED.to_string(),
                    Err(SessionError::AlreadyLoggedIn) => SessionError::AlreadyLoggedIn.to_string(),
                    Err(e) => format!("Error: {e}. Please manually signup at {MANUAL_SIGNUP_URL}"),
                }
            }
            Command::Logout => match self.sessions.logout(user_id) {
                Ok(_) => "Successfully logged out".to_string(),
                Err(e) => e.to_string(),
            },
            Command::NewChat => match self.sessions.new_chat(user_id).await {
                Ok(_) => "Successfully created a new chat conversation.".to_string(),
                Err(SessionError::NotLoggedIn) => NOT_LOGGED_IN_HINT.to_string(),
                Err(e) => format!("Error: {e}"),
            },
        }
    }
}

fn info_text(message: &Message) -> String {
    let user_id = message
        .reply_to
        .as_ref()
        .and_then(|r| r.user_id)
        .unwrap_or(message.user.id);
    format!("Your ID: {}\nChat ID: {}", user_id, message.chat.id)
}

fn msginfo_text(message: &Message) -> String {
    let Some(replied) = &message.reply_to else {
        return MSGINFO_HINT.to_string();
    };
    let from = replied
        .user_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "Message ID: {}\nFrom: {}\nChat ID: {}\nDate: {}",
        replied.message_id,
        from,
        message.chat.id,
        replied.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

#[async_trait]
impl Handler for CommandHandler {
    #[instrument(skip(self, message), fields(user_id = message.user.id, chat_id = message.chat.id))]
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        let Some(line) = CommandLine::parse(&message.content) else {
            return Ok(HandlerResponse::Continue);
        };
        let Some(command) = Command::from_name(&line.name) else {
            return Ok(HandlerResponse::Continue);
        };
        let me = self.bot_username.read().await.clone();
        if !line.is_addressed_to(me.as_deref()) {
            return Ok(HandlerResponse::Continue);
        }

        info!(?command, "step: CommandHandler executing");
        let reply = self.execute(command, &line.args, message).await;
        if let Err(e) = self.bot.reply_to(message, &reply).await {
            warn!(error = %e, ?command, "Failed to send command reply");
        }
        Ok(HandlerResponse::Reply(reply))
    }
}
