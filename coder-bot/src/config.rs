//! Bot config: Telegram connectivity, logging, Deepseek API and relay policy. Loaded from env.

use anyhow::Result;
use dbot_telegram::TelegramConfig;
use deepseek_client::{ClientConfig, StreamConfig, DEFAULT_BASE_URL};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use stream_relay::RelayConfig;

#[derive(Debug, Clone)]
pub struct BotConfig {
    /// BOT_TOKEN, TELEGRAM_API_URL or TELOXIDE_API_URL
    pub telegram: TelegramConfig,
    /// LOG_FILE
    pub log_file: String,
    /// DEEPSEEK_API_URL
    pub deepseek_api_url: String,
    /// DEEPSEEK_REQUEST_TIMEOUT_SECS
    pub deepseek_request_timeout: Duration,
    /// RELAY_MAX_MALFORMED_FRAMES, RELAY_CHANNEL_CAPACITY
    pub stream: StreamConfig,
    /// RELAY_EDIT_INTERVAL_MS, RELAY_STREAM_IDLE_TIMEOUT_SECS, RELAY_GATEWAY_TIMEOUT_SECS, RELAY_PLACEHOLDER
    pub relay: RelayConfig,
}

impl BotConfig {
    /// Load from environment variables. `token` overrides BOT_TOKEN if provided.
    pub fn load(token: Option<String>) -> Result<Self> {
        Self::from_vars(token, |key| env::var(key).ok())
    }

    /// Same as [`BotConfig::load`] with a custom variable lookup.
    pub fn from_vars<F>(token: Option<String>, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let telegram = TelegramConfig::from_vars(token, &var)?;
        let log_file = telegram
            .log_file
            .clone()
            .unwrap_or_else(|| "logs/coder-bot.log".to_string());

        let parsed = |key: &str| var(key).and_then(|v| v.trim().parse::<u64>().ok());
        let defaults = RelayConfig::default();
        let stream_defaults = StreamConfig::default();

        let mut relay = RelayConfig {
            edit_interval: parsed("RELAY_EDIT_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.edit_interval),
            stream_idle_timeout: parsed("RELAY_STREAM_IDLE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.stream_idle_timeout),
            gateway_timeout: parsed("RELAY_GATEWAY_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.gateway_timeout),
            ..defaults
        };
        if let Some(placeholder) = var("RELAY_PLACEHOLDER").filter(|p| !p.trim().is_empty()) {
            relay.placeholder_text = placeholder;
        }

        Ok(Self {
            telegram,
            log_file,
            deepseek_api_url: var("DEEPSEEK_API_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            deepseek_request_timeout: Duration::from_secs(
                parsed("DEEPSEEK_REQUEST_TIMEOUT_SECS").unwrap_or(30),
            ),
            stream: StreamConfig {
                channel_capacity: parse_or(var("RELAY_CHANNEL_CAPACITY"), stream_defaults.channel_capacity),
                max_malformed_frames: parse_or(
                    var("RELAY_MAX_MALFORMED_FRAMES"),
                    stream_defaults.max_malformed_frames,
                ),
            },
            relay,
        })
    }

    /// Validate config: URLs must parse, intervals and capacities must be non-zero.
    pub fn validate(&self) -> Result<()> {
        self.telegram.validate()?;
        if reqwest::Url::parse(&self.deepseek_api_url).is_err() {
            anyhow::bail!("DEEPSEEK_API_URL is not a valid URL: {}", self.deepseek_api_url);
        }
        let non_zero = [
            ("RELAY_EDIT_INTERVAL_MS", self.relay.edit_interval.is_zero()),
            ("RELAY_STREAM_IDLE_TIMEOUT_SECS", self.relay.stream_idle_timeout.is_zero()),
            ("RELAY_GATEWAY_TIMEOUT_SECS", self.relay.gateway_timeout.is_zero()),
            ("DEEPSEEK_REQUEST_TIMEOUT_SECS", self.deepseek_request_timeout.is_zero()),
            ("RELAY_CHANNEL_CAPACITY", self.stream.channel_capacity == 0),
        ];
        if let Some((key, _)) = non_zero.iter().find(|(_, zero)| *zero) {
            anyhow::bail!("{key} must be greater than zero");
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.deepseek_api_url.clone(),
            request_timeout: self.deepseek_request_timeout,
            stream: self.stream,
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<BotConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BotConfig::from_vars(None, move |key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("BOT_TOKEN", "123:abc")]).unwrap();
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.log_file, "logs/coder-bot.log");
        assert_eq!(config.deepseek_api_url, DEFAULT_BASE_URL);
        assert_eq!(config.relay.edit_interval, Duration::from_millis(500));
        assert_eq!(config.relay.stream_idle_timeout, Duration::from_secs(120));
        assert_eq!(config.stream, StreamConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_token_argument_overrides_env() {
        let vars: HashMap<&str, &str> = [("BOT_TOKEN", "from-env")].into_iter().collect();
        let config = BotConfig::from_vars(Some("from-cli".to_string()), |key| {
            vars.get(key).map(|v| v.to_string())
        })
        .unwrap();
        assert_eq!(config.telegram.bot_token, "from-cli");
    }

    #[test]
    fn test_missing_token_is_an_error() {
        assert!(config_from(&[]).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("BOT_TOKEN", "t"),
            ("TELOXIDE_API_URL", "http://localhost:8081"),
            ("DEEPSEEK_API_URL", "http://127.0.0.1:9000/api/v0"),
            ("RELAY_EDIT_INTERVAL_MS", "1200"),
            ("RELAY_MAX_MALFORMED_FRAMES", "3"),
            ("RELAY_PLACEHOLDER", "Thinking..."),
        ])
        .unwrap();
        assert_eq!(
            config.telegram.telegram_api_url.as_deref(),
            Some("http://localhost:8081")
        );
        assert_eq!(config.relay.edit_interval, Duration::from_millis(1200));
        assert_eq!(config.relay.placeholder_text, "Thinking...");
        assert_eq!(config.stream.max_malformed_frames, 3);
        assert_eq!(config.client_config().base_url, "http://127.0.0.1:9000/api/v0");
    }

    #[test]
    fn test_unparseable_numbers_fall_back_to_defaults() {
        let config = config_from(&[("BOT_TOKEN", "t"), ("RELAY_EDIT_INTERVAL_MS", "soon")]).unwrap();
        assert_eq!(config.relay.edit_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_validate_rejects_bad_url_and_zero_interval() {
        let config = config_from(&[("BOT_TOKEN", "t"), ("DEEPSEEK_API_URL", "nope")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[("BOT_TOKEN", "t"), ("RELAY_EDIT_INTERVAL_MS", "0")]).unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("RELAY_EDIT_INTERVAL_MS"));
    }
}
