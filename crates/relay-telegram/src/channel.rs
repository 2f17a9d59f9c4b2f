//! Telegram Bot API channel: one `sendMessage` call per outbound message.

use std::time::Duration;

use async_trait::async_trait;
use relay_channels::{Channel, ChannelError};
use relay_core::config::TelegramConfig;
use relay_core::OutboundMessage;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::error::TelegramError;
use crate::send::{failure_reason, SendMessage};

pub struct TelegramChannel {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl TelegramChannel {
    pub fn new(
        bot_token: impl Into<String>,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TelegramError> {
        let bot_token = bot_token.into();
        if bot_token.trim().is_empty() {
            return Err(TelegramError::NoToken);
        }

        let api_base = api_base.into().trim_end_matches('/').to_string();
        if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
            return Err(TelegramError::InvalidApiBase(api_base));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base,
            bot_token,
        })
    }

    pub fn from_config(cfg: &TelegramConfig) -> Result<Self, TelegramError> {
        Self::new(
            cfg.bot_token.clone(),
            cfg.api_base.clone(),
            Duration::from_secs(cfg.timeout_secs),
        )
    }

    /// Full method URL. Contains the bot token: never log it.
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError> {
        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&SendMessage::from(msg))
            .send()
            .await
            // reqwest errors embed the request URL, which carries the token.
            .map_err(|e| ChannelError::Transport(e.without_url().to_string()))?;

        let status = resp.status();
        if status.is_success() {
            debug!(chat_id = %msg.target.chat_id, "telegram: message sent");
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        let reason = failure_reason(&body);
        warn!(
            chat_id = %msg.target.chat_id,
            status = status.as_u16(),
            reason = %reason,
            "telegram: sendMessage rejected"
        );

        match status {
            StatusCode::UNAUTHORIZED => Err(ChannelError::AuthFailed(reason)),
            _ => Err(ChannelError::Rejected {
                status: status.as_u16(),
                body: reason,
            }),
        }
    }
}
