/// Errors produced while setting up the Telegram channel.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("no bot token configured")]
    NoToken,

    #[error("invalid api_base {0:?}: must start with http:// or https://")]
    InvalidApiBase(String),
}
