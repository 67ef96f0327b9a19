//! Platform events published to the message bus

use serde::Serialize;
use uuid::Uuid;

use crate::domain::messaging::MessageStatus;

/// Events other services (driver apps, admin dashboards) subscribe to.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlatformEvent {
    OrderStatusChanged {
        order_id: Uuid,
        store_id: Uuid,
        status: String,
    },
    MessageStatusChanged {
        evolution_message_id: String,
        status: MessageStatus,
        campaign_id: Option<Uuid>,
    },
}

impl PlatformEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::OrderStatusChanged { .. } => "menuflow.orders.status",
            Self::MessageStatusChanged { .. } => "menuflow.whatsapp.status",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = PlatformEvent::MessageStatusChanged {
            evolution_message_id: "M1".into(),
            status: MessageStatus::Delivered,
            campaign_id: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "message_status_changed");
        assert_eq!(json["status"], "delivered");
        assert_eq!(event.subject(), "menuflow.whatsapp.status");
    }
}
