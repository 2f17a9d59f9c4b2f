use serde::{Deserialize, Serialize};
use std::fmt;

/// Telegram chat identifier: a numeric chat ID or an `@channelusername`.
///
/// Serialized untagged so it lands on the wire exactly as configured.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Id(id) => write!(f, "{id}"),
            ChatId::Username(name) => write!(f, "{name}"),
        }
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for ChatId {
    fn from(s: &str) -> Self {
        Self::Username(s.to_string())
    }
}

/// Markup mode requested from the chat platform for an outbound message.
///
/// Only the Markdown flavours are offered: messages are escaped with
/// backslashes, which HTML mode does not understand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    #[default]
    MarkdownV2,
    /// Telegram's legacy Markdown mode.
    Markdown,
}

impl ParseMode {
    /// Value sent in the `parse_mode` field of `sendMessage`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMode::MarkdownV2 => "MarkdownV2",
            ParseMode::Markdown => "Markdown",
        }
    }
}

/// Where a message is delivered: a chat, and optionally a forum topic inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryTarget {
    pub chat_id: ChatId,
    /// Forum topic. Only sent to the API when present.
    pub message_thread_id: Option<i64>,
}

impl DeliveryTarget {
    pub fn new(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            message_thread_id: None,
        }
    }

    pub fn with_thread(mut self, thread_id: i64) -> Self {
        self.message_thread_id = Some(thread_id);
        self
    }
}

/// A fully formatted notification, ready for exactly one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub text: String,
    pub target: DeliveryTarget,
    pub parse_mode: ParseMode,
}
