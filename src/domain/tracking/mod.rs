//! Order lifecycle catalog and timeline support
//!
//! The forward sequence is fixed: pending → confirmed → preparing → ready →
//! out_for_delivery → delivered. `cancelled` is terminal and out-of-band: it
//! never participates in the linear ordering, is never "completed" relative
//! to any forward status, and renders at zero progress.
//!
//! All lookups accept raw status strings and degrade gracefully on values
//! this version does not know about, so newer backends can introduce
//! statuses without breaking older tracking surfaces.

pub mod eta;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "preparing" => Some(Self::Preparing),
            "ready" => Some(Self::Ready),
            "out_for_delivery" => Some(Self::OutForDelivery),
            "delivered" => Some(Self::Delivered),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

/// One step of the customer-facing tracking timeline.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct TrackingStep {
    pub status: OrderStatus,
    pub label: &'static str,
    pub description: &'static str,
}

/// Forward steps in display order. `cancelled` is intentionally absent.
pub const TRACKING_STEPS: [TrackingStep; 6] = [
    TrackingStep {
        status: OrderStatus::Pending,
        label: "Pedido Recibido",
        description: "Tu pedido ha sido recibido y está siendo procesado",
    },
    TrackingStep {
        status: OrderStatus::Confirmed,
        label: "Confirmado",
        description: "El restaurante ha confirmado tu pedido",
    },
    TrackingStep {
        status: OrderStatus::Preparing,
        label: "En Preparación",
        description: "Tu pedido está siendo preparado",
    },
    TrackingStep {
        status: OrderStatus::Ready,
        label: "Listo",
        description: "Tu pedido está listo para ser entregado",
    },
    TrackingStep {
        status: OrderStatus::OutForDelivery,
        label: "En Camino",
        description: "Tu pedido está en camino",
    },
    TrackingStep {
        status: OrderStatus::Delivered,
        label: "Entregado",
        description: "Tu pedido ha sido entregado",
    },
];

fn step_for(raw: &str) -> Option<&'static TrackingStep> {
    TRACKING_STEPS.iter().find(|s| s.status.as_str() == raw)
}

/// Display label, falling back to the raw status string when unknown.
pub fn label_of(raw: &str) -> &str {
    step_for(raw).map(|s| s.label).unwrap_or(raw)
}

/// Display description, empty when unknown.
pub fn description_of(raw: &str) -> &str {
    step_for(raw).map(|s| s.description).unwrap_or("")
}

/// Badge variant used by admin and tracking UIs.
pub fn variant_of(raw: &str) -> &'static str {
    match raw {
        "delivered" => "default",
        "cancelled" => "destructive",
        "preparing" | "out_for_delivery" => "secondary",
        _ => "outline",
    }
}

/// Position in the forward sequence; `None` for `cancelled` and anything
/// unrecognized.
pub fn index_of(raw: &str) -> Option<usize> {
    TRACKING_STEPS.iter().position(|s| s.status.as_str() == raw)
}

/// Whether an order currently at `current` has reached `target`.
///
/// False whenever either side is outside the forward sequence, so
/// `cancelled` is never at-or-past anything and nothing is at-or-past it.
pub fn is_completed(current: &str, target: &str) -> bool {
    match (index_of(current), index_of(target)) {
        (Some(c), Some(t)) => c >= t,
        _ => false,
    }
}

/// Progress through the forward sequence as 0..=100.
pub fn progress_percentage(raw: &str) -> u8 {
    let Some(index) = index_of(raw) else {
        return 0;
    };
    if raw == "delivered" {
        return 100;
    }
    let total = TRACKING_STEPS.len() - 1;
    ((index as f64 / total as f64) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_fall_back_to_raw_status() {
        assert_eq!(label_of("preparing"), "En Preparación");
        assert_eq!(label_of("awaiting_drone"), "awaiting_drone");
        assert_eq!(description_of("awaiting_drone"), "");
    }

    #[test]
    fn cancelled_is_outside_the_forward_sequence() {
        assert_eq!(index_of("cancelled"), None);
        assert_eq!(index_of("bogus"), None);
        assert_eq!(index_of("pending"), Some(0));
        assert_eq!(index_of("delivered"), Some(5));
    }

    #[test]
    fn every_forward_status_completes_itself() {
        for step in &TRACKING_STEPS {
            let raw = step.status.as_str();
            assert!(is_completed(raw, raw), "{raw} should complete itself");
        }
    }

    #[test]
    fn cancelled_never_completes_and_is_never_completed() {
        for step in &TRACKING_STEPS {
            let raw = step.status.as_str();
            assert!(!is_completed("cancelled", raw));
            assert!(!is_completed(raw, "cancelled"));
        }
        assert!(!is_completed("cancelled", "cancelled"));
    }

    #[test]
    fn later_statuses_complete_earlier_ones() {
        assert!(is_completed("ready", "preparing"));
        assert!(is_completed("delivered", "pending"));
        assert!(!is_completed("confirmed", "ready"));
    }

    #[test]
    fn progress_endpoints() {
        assert_eq!(progress_percentage("delivered"), 100);
        assert_eq!(progress_percentage("cancelled"), 0);
        assert_eq!(progress_percentage("nonsense"), 0);
        assert_eq!(progress_percentage("pending"), 0);
    }

    #[test]
    fn progress_is_non_decreasing_along_the_sequence() {
        let mut last = 0;
        for step in &TRACKING_STEPS {
            let p = progress_percentage(step.status.as_str());
            assert!(p >= last, "{} regressed to {p}", step.status.as_str());
            last = p;
        }
    }

    #[test]
    fn status_round_trips_through_parse() {
        for step in &TRACKING_STEPS {
            assert_eq!(OrderStatus::parse(step.status.as_str()), Some(step.status));
        }
        assert_eq!(OrderStatus::parse("cancelled"), Some(OrderStatus::Cancelled));
        assert_eq!(OrderStatus::parse("shipped"), None);
    }
}
