use std::collections::HashMap;
use std::path::Path;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};
use crate::types::{ChatId, DeliveryTarget, ParseMode};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_CONFIG_PATH: &str = "conf.toml";
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Characters escaped by default. Backslash comes first so the
/// backslashes inserted by later passes are not escaped again.
pub const DEFAULT_ESCAPE_CHARS: &[&str] = &[
    "\\", "_", "*", "[", "]", "(", ")", "~", "`", ">", "#", "+", "-", "=", "|", "{", "}", ".",
    "!",
];

/// Top-level config (conf.toml + RELAY_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub format: FormatConfig,
    /// Event-type tag → enabled. Tags not listed here are ignored.
    #[serde(default)]
    pub events: HashMap<String, bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// Inbound webhook settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Value Harbor sends verbatim in the `Authorization` header (the policy's
    /// "Auth Header" field). When unset, requests are not authenticated.
    pub auth_header: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: ChatId,
    /// Forum topic to post into. Omitted from API calls when unset.
    pub message_thread_id: Option<i64>,
    #[serde(default)]
    pub parse_mode: ParseMode,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl TelegramConfig {
    pub fn target(&self) -> DeliveryTarget {
        DeliveryTarget {
            chat_id: self.chat_id.clone(),
            message_thread_id: self.message_thread_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatConfig {
    /// Ordered list of single characters to backslash-escape.
    #[serde(default = "default_escape_chars")]
    pub escape_chars: Vec<String>,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            escape_chars: default_escape_chars(),
        }
    }
}

impl FormatConfig {
    /// Convert the configured entries to characters, keeping their order.
    pub fn escape_set(&self) -> Result<Vec<char>> {
        self.escape_chars
            .iter()
            .map(|entry| {
                let mut chars = entry.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(RelayError::InvalidEscapeChar {
                        entry: entry.clone(),
                    }),
                }
            })
            .collect()
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_api_base() -> String {
    DEFAULT_TELEGRAM_API_BASE.to_string()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_escape_chars() -> Vec<String> {
    DEFAULT_ESCAPE_CHARS.iter().map(|s| s.to_string()).collect()
}

/// Env keys arrive in whatever case the variable was written in. Field names
/// are lowercase, event tags uppercase.
fn env_key(key: &str) -> String {
    match key.split_once('.') {
        Some((section, tag)) if section.eq_ignore_ascii_case("events") => {
            format!("events.{}", tag.to_ascii_uppercase())
        }
        _ => key.to_ascii_lowercase(),
    }
}

impl RelayConfig {
    /// Load config from a TOML file with RELAY_* env var overrides.
    ///
    /// Nested keys use a double underscore, e.g. `RELAY_TELEGRAM__BOT_TOKEN`
    /// or `RELAY_EVENTS__PUSH_ARTIFACT=false`.
    /// Unlike most settings a missing file is an error: the relay has no
    /// usable defaults for the bot token or chat.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(RelayError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let config: RelayConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(
                Env::prefixed("RELAY_")
                    .split("__")
                    .map(|key| env_key(key.as_str()).into())
                    .lowercase(false),
            )
            .extract()
            .map_err(|e| RelayError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Parse config from an in-memory TOML document (no env overrides).
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: RelayConfig = Figment::new()
            .merge(Toml::string(toml))
            .extract()
            .map_err(|e| RelayError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Checks that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(RelayError::Config("telegram.bot_token is empty".into()));
        }
        self.format.escape_set()?;
        Ok(())
    }

    /// Event tags switched on, sorted for stable startup logging.
    pub fn enabled_events(&self) -> Vec<&str> {
        let mut enabled: Vec<&str> = self
            .events
            .iter()
            .filter(|(_, on)| **on)
            .map(|(tag, _)| tag.as_str())
            .collect();
        enabled.sort_unstable();
        enabled
    }
}
