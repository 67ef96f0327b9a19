//! Estimated completion time
//!
//! A heuristic over the order's own metadata, with no routing or traffic
//! input. Deterministic for a given order: the rush-hour check reads the
//! order's creation hour, never the caller's wall clock.

use chrono::{DateTime, Duration, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Delivery,
    Pickup,
    DineIn,
}

impl OrderType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "delivery" => Self::Delivery,
            "dine_in" => Self::DineIn,
            _ => Self::Pickup,
        }
    }
}

/// Lunch 12:00–14:00 and dinner 19:00–21:00, hour-inclusive on both ends.
pub fn is_rush_hour<Tz: TimeZone>(at: &DateTime<Tz>) -> bool {
    let hour = at.hour();
    (12..=14).contains(&hour) || (19..=21).contains(&hour)
}

/// Estimate when the order will be completed or delivered.
///
/// Base minutes depend on how far along the order already is, plus a
/// preparation-load penalty of 3 minutes per line item capped at 20, plus a
/// flat 15 for delivery orders and 10 when created during a rush window.
/// A delivered order estimates to its creation timestamp unchanged. The
/// result is never earlier than `created_at`.
pub fn estimated_completion<Tz: TimeZone>(
    created_at: DateTime<Tz>,
    item_count: usize,
    order_type: OrderType,
    status: &str,
) -> DateTime<Tz> {
    let mut minutes: i64 = match status {
        "pending" | "confirmed" => 35,
        "preparing" => 25,
        "ready" => 20,
        "out_for_delivery" => 15,
        "delivered" => return created_at,
        _ => 30,
    };

    minutes += (item_count as i64 * 3).min(20);

    if order_type == OrderType::Delivery {
        minutes += 15;
    }

    if is_rush_hour(&created_at) {
        minutes += 10;
    }

    created_at + Duration::minutes(minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, hour, 30, 0).unwrap()
    }

    #[test]
    fn delivered_orders_estimate_to_creation_time() {
        let created = at(10);
        assert_eq!(
            estimated_completion(created, 8, OrderType::Delivery, "delivered"),
            created
        );
    }

    #[test]
    fn pickup_order_off_peak() {
        let created = at(10);
        // 35 base + 2 items * 3
        let eta = estimated_completion(created, 2, OrderType::Pickup, "pending");
        assert_eq!(eta, created + Duration::minutes(41));
    }

    #[test]
    fn delivery_surcharge_and_rush_penalty() {
        let created = at(13);
        // 25 base + 6 + 15 delivery + 10 rush
        let eta = estimated_completion(created, 2, OrderType::Delivery, "preparing");
        assert_eq!(eta, created + Duration::minutes(56));
    }

    #[test]
    fn item_penalty_caps_at_twenty_minutes() {
        let created = at(10);
        let small = estimated_completion(created, 7, OrderType::Pickup, "ready");
        let large = estimated_completion(created, 40, OrderType::Pickup, "ready");
        assert_eq!(small, created + Duration::minutes(40));
        assert_eq!(large, small);
    }

    #[test]
    fn unknown_status_uses_default_base() {
        let created = at(10);
        let eta = estimated_completion(created, 0, OrderType::Pickup, "on_hold");
        assert_eq!(eta, created + Duration::minutes(30));
    }

    #[test]
    fn rush_windows_are_hour_inclusive() {
        assert!(is_rush_hour(&at(12)));
        assert!(is_rush_hour(&at(14)));
        assert!(is_rush_hour(&at(19)));
        assert!(is_rush_hour(&at(21)));
        assert!(!is_rush_hour(&at(11)));
        assert!(!is_rush_hour(&at(15)));
        assert!(!is_rush_hour(&at(22)));
    }

    #[test]
    fn estimate_never_precedes_creation() {
        for status in ["pending", "preparing", "ready", "out_for_delivery", "delivered", "x"] {
            for items in [0usize, 1, 5, 30] {
                let eta = estimated_completion(at(20), items, OrderType::Delivery, status);
                assert!(eta >= at(20));
            }
        }
    }
}
