//! Transport config: token, API URL and log path.
//! Loaded from BOT_TOKEN, TELEGRAM_API_URL (or TELOXIDE_API_URL) and LOG_FILE.

use anyhow::Result;
use tracing::error;

/// Telegram connectivity and logging; nothing else.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub telegram_api_url: Option<String>,
    pub log_file: Option<String>,
}

impl TelegramConfig {
    /// Reads through `var`; `token` wins over BOT_TOKEN. BOT_TOKEN is required, the rest optional.
    pub fn from_vars<F>(token: Option<String>, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(bot_token) = token.or_else(|| var("BOT_TOKEN")) else {
            anyhow::bail!("BOT_TOKEN not set (pass --token or set it in .env)");
        };
        Ok(Self {
            bot_token,
            telegram_api_url: var("TELEGRAM_API_URL").or_else(|| var("TELOXIDE_API_URL")),
            log_file: var("LOG_FILE"),
        })
    }

    pub fn with_token(bot_token: String) -> Self {
        Self {
            bot_token,
            telegram_api_url: None,
            log_file: None,
        }
    }

    /// Checks the API URL, if one is set.
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            anyhow::bail!("BOT_TOKEN is empty");
        }
        if let Some(url) = &self.telegram_api_url {
            reqwest::Url::parse(url)
                .map_err(|e| anyhow::anyhow!("Invalid TELEGRAM_API_URL {url}: {e}"))?;
        }
        Ok(())
    }

    /// Builds the teloxide bot, pointing it at a custom API server when configured.
    pub fn build_bot(&self) -> teloxide::Bot {
        let bot = teloxide::Bot::new(self.bot_token.clone());
        match self.telegram_api_url.as_deref().map(reqwest::Url::parse) {
            Some(Ok(url)) => bot.set_api_url(url),
            Some(Err(e)) => {
                error!(error = %e, "Invalid TELEGRAM_API_URL, using default");
                bot
            }
            None => bot,
        }
    }
}
