//! Vendor webhook payloads and the status reducer
//!
//! The Evolution-style vendor posts `{"event": "...", "data": {...}}` with a
//! different `data` shape per event, so the payload is a tagged union keyed
//! by `event`. Events this version does not understand deserialize into the
//! catch-all variant and are ignored, never rejected.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::MessageStatus;

pub const DEFAULT_FAILURE_MESSAGE: &str = "Delivery failed";

/// Vendor correlation key: the vendor's own id for the message it reports on.
#[derive(Clone, Debug, Deserialize)]
pub struct MessageKey {
    pub id: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum WebhookEvent {
    /// Delivery receipt for a message already handed to the vendor.
    #[serde(rename = "messages.update")]
    MessageUpdate {
        key: MessageKey,
        #[serde(default)]
        status: Option<String>,
        /// Vendor error text, present on failures.
        #[serde(default)]
        message: Option<String>,
    },
    /// Confirmation that the vendor accepted the message for sending.
    #[serde(rename = "send.message")]
    SendConfirmation { key: MessageKey },
    #[serde(other)]
    Unknown,
}

impl WebhookEvent {
    pub fn message_id(&self) -> Option<&str> {
        match self {
            Self::MessageUpdate { key, .. } | Self::SendConfirmation { key } => Some(&key.id),
            Self::Unknown => None,
        }
    }
}

/// The single state mutation a webhook event asks for.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusChange {
    pub status: MessageStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl StatusChange {
    fn new(status: MessageStatus) -> Self {
        Self { status, sent_at: None, delivered_at: None, read_at: None, error_message: None }
    }
}

/// Map a vendor event to the status change it implies, if any.
///
/// Unknown events and unrecognized vendor status codes reduce to `None`;
/// the handler logs and acknowledges them without touching state.
pub fn reduce(event: &WebhookEvent, now: DateTime<Utc>) -> Option<StatusChange> {
    match event {
        WebhookEvent::MessageUpdate { status, message, .. } => {
            match status.as_deref() {
                Some("DELIVERY_ACK") | Some("delivered") => {
                    let mut change = StatusChange::new(MessageStatus::Delivered);
                    change.delivered_at = Some(now);
                    Some(change)
                }
                Some("READ") | Some("read") => {
                    let mut change = StatusChange::new(MessageStatus::Read);
                    change.read_at = Some(now);
                    Some(change)
                }
                Some("ERROR") | Some("failed") => {
                    let mut change = StatusChange::new(MessageStatus::Failed);
                    change.error_message = Some(
                        message.clone().unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
                    );
                    Some(change)
                }
                _ => None,
            }
        }
        WebhookEvent::SendConfirmation { .. } => {
            let mut change = StatusChange::new(MessageStatus::Sent);
            change.sent_at = Some(now);
            Some(change)
        }
        WebhookEvent::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> WebhookEvent {
        serde_json::from_str(json).expect("valid webhook payload")
    }

    #[test]
    fn deserializes_message_update() {
        let event = parse(r#"{"event":"messages.update","data":{"key":{"id":"M1"},"status":"READ"}}"#);
        assert_eq!(event.message_id(), Some("M1"));
        let change = reduce(&event, Utc::now()).expect("read maps to a change");
        assert_eq!(change.status, MessageStatus::Read);
        assert!(change.read_at.is_some());
        assert!(change.delivered_at.is_none());
    }

    #[test]
    fn deserializes_send_confirmation() {
        let event = parse(r#"{"event":"send.message","data":{"key":{"id":"M2"}}}"#);
        assert_eq!(event.message_id(), Some("M2"));
        let change = reduce(&event, Utc::now()).expect("send maps to sent");
        assert_eq!(change.status, MessageStatus::Sent);
        assert!(change.sent_at.is_some());
    }

    #[test]
    fn unknown_event_types_are_tolerated() {
        let event = parse(r#"{"event":"connection.update","data":{"state":"open"}}"#);
        assert!(matches!(event, WebhookEvent::Unknown));
        assert_eq!(event.message_id(), None);
        assert_eq!(reduce(&event, Utc::now()), None);
    }

    #[test]
    fn both_vendor_spellings_of_delivered_map() {
        for code in ["DELIVERY_ACK", "delivered"] {
            let json = format!(r#"{{"event":"messages.update","data":{{"key":{{"id":"M"}},"status":"{code}"}}}}"#);
            let change = reduce(&parse(&json), Utc::now()).expect("delivered change");
            assert_eq!(change.status, MessageStatus::Delivered);
            assert!(change.delivered_at.is_some());
        }
    }

    #[test]
    fn failure_defaults_the_error_text() {
        let event = parse(r#"{"event":"messages.update","data":{"key":{"id":"M"},"status":"ERROR"}}"#);
        let change = reduce(&event, Utc::now()).expect("failed change");
        assert_eq!(change.status, MessageStatus::Failed);
        assert_eq!(change.error_message.as_deref(), Some(DEFAULT_FAILURE_MESSAGE));

        let event = parse(
            r#"{"event":"messages.update","data":{"key":{"id":"M"},"status":"failed","message":"number blocked"}}"#,
        );
        let change = reduce(&event, Utc::now()).expect("failed change");
        assert_eq!(change.error_message.as_deref(), Some("number blocked"));
    }

    #[test]
    fn unrecognized_vendor_status_code_is_a_no_op() {
        let event = parse(r#"{"event":"messages.update","data":{"key":{"id":"M"},"status":"SERVER_ACK"}}"#);
        assert_eq!(reduce(&event, Utc::now()), None);
        let event = parse(r#"{"event":"messages.update","data":{"key":{"id":"M"}}}"#);
        assert_eq!(reduce(&event, Utc::now()), None);
    }
}
