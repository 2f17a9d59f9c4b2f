//! Bot API `sendMessage` request/response shapes.

use relay_core::{ChatId, OutboundMessage};
use serde::{Deserialize, Serialize};

/// JSON body of a `sendMessage` call.
#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: &'a ChatId,
    pub text: &'a str,
    pub parse_mode: &'static str,
    /// Only sent for forum topics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
}

impl<'a> From<&'a OutboundMessage> for SendMessage<'a> {
    fn from(msg: &'a OutboundMessage) -> Self {
        Self {
            chat_id: &msg.target.chat_id,
            text: &msg.text,
            parse_mode: msg.parse_mode.as_str(),
            message_thread_id: msg.target.message_thread_id,
        }
    }
}

/// The part of a failed Bot API response the relay reports.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub description: Option<String>,
}

/// Best human-readable reason from a failed response body.
///
/// Falls back to the raw body (trimmed to a sane length) when it is not a
/// Bot API envelope, e.g. an HTML page from a proxy.
pub fn failure_reason(body: &str) -> String {
    const MAX_RAW: usize = 200;

    match serde_json::from_str::<ApiError>(body) {
        Ok(ApiError {
            description: Some(description),
            ..
        }) => description,
        _ => body.chars().take(MAX_RAW).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::{DeliveryTarget, ParseMode};
    use serde_json::json;

    fn message(target: DeliveryTarget) -> OutboundMessage {
        OutboundMessage {
            text: "📦 *New push*".into(),
            target,
            parse_mode: ParseMode::MarkdownV2,
        }
    }

    #[test]
    fn thread_id_omitted_when_unset() {
        let msg = message(DeliveryTarget::new(ChatId::Id(-100500)));
        let body = serde_json::to_value(SendMessage::from(&msg)).unwrap();
        assert_eq!(
            body,
            json!({
                "chat_id": -100500,
                "text": "📦 *New push*",
                "parse_mode": "MarkdownV2"
            })
        );
    }

    #[test]
    fn thread_id_included_when_set() {
        let msg = message(DeliveryTarget::new(ChatId::from("@builds")).with_thread(0));
        let body = serde_json::to_value(SendMessage::from(&msg)).unwrap();
        assert_eq!(body["chat_id"], "@builds");
        assert_eq!(body["message_thread_id"], 0);
    }

    #[test]
    fn failure_reason_prefers_description() {
        let body = r#"{"ok":false,"error_code":400,"description":"Bad Request: can't parse entities"}"#;
        assert_eq!(failure_reason(body), "Bad Request: can't parse entities");
    }

    #[test]
    fn failure_reason_without_description_uses_body() {
        assert_eq!(failure_reason(r#"{"ok":false}"#), r#"{"ok":false}"#);
    }

    #[test]
    fn failure_reason_truncates_raw_bodies() {
        let body = "x".repeat(1000);
        assert_eq!(failure_reason(&body).len(), 200);
        assert_eq!(failure_reason("Bad Gateway"), "Bad Gateway");
    }
}
