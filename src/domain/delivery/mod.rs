//! Delivery fee and free-delivery eligibility
//!
//! A store prices delivery either with a flat fee (`fixed`) or per delivery
//! zone (`by_zone`). Free delivery above a minimum cart amount can be enabled
//! store-wide, and each zone can opt out or override the threshold.
//! `quote` is a pure decision function called on every cart/checkout render.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::Price;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    Fixed,
    ByZone,
}

impl PricingMode {
    /// Stored configuration values predate the enum; anything unrecognized
    /// falls back to flat pricing.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "by_zone" => Self::ByZone,
            _ => Self::Fixed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::ByZone => "by_zone",
        }
    }
}

/// Store-level delivery pricing configuration. Mutated only through the
/// admin settings endpoints; read-only input to the calculator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreDeliveryConfig {
    pub pricing_mode: PricingMode,
    pub fixed_price: Price,
    pub free_delivery_enabled: bool,
    pub global_free_delivery_min_amount: Option<Price>,
}

/// A named delivery area with its own price and free-delivery override.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeliveryZone {
    pub id: Uuid,
    pub name: String,
    pub delivery_price: Price,
    pub free_delivery_enabled: bool,
    pub free_delivery_min_amount: Option<Price>,
}

/// Computed per-quote, never persisted.
///
/// `is_free_delivery` holds iff `can_have_free_delivery` holds and the cart
/// reached the effective threshold; a free quote always carries a zero fee.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeliveryQuote {
    pub delivery_fee: Price,
    pub is_free_delivery: bool,
    pub amount_needed_for_free_delivery: Option<Price>,
    pub free_delivery_threshold: Option<Price>,
    pub can_have_free_delivery: bool,
}

impl DeliveryQuote {
    /// Quote with the base fee and no reachable free-delivery path.
    fn without_free_delivery(fee: Price) -> Self {
        Self {
            delivery_fee: fee,
            is_free_delivery: false,
            amount_needed_for_free_delivery: None,
            free_delivery_threshold: None,
            can_have_free_delivery: false,
        }
    }
}

/// Compute the delivery fee and free-delivery eligibility for a cart.
///
/// Branches are evaluated top to bottom, first match wins:
/// 1. no store loaded yet: zero fee, nothing reachable;
/// 2. free delivery disabled store-wide: base fee, regardless of zones;
/// 3. `by_zone` with a zone that opted out: base fee, unreachable;
/// 4. no usable threshold (unset, non-positive, or `by_zone` without a
///    selected zone): base fee, unreachable;
/// 5. otherwise compare the cart total against the threshold. Equality
///    qualifies. Zone thresholds take precedence over the global one.
pub fn quote(
    store: Option<&StoreDeliveryConfig>,
    selected_zone: Option<&DeliveryZone>,
    cart_total: Price,
) -> DeliveryQuote {
    let Some(store) = store else {
        return DeliveryQuote::without_free_delivery(Price::ZERO);
    };

    let base_fee = match store.pricing_mode {
        PricingMode::Fixed => store.fixed_price,
        PricingMode::ByZone => selected_zone.map(|z| z.delivery_price).unwrap_or(Price::ZERO),
    };

    if !store.free_delivery_enabled {
        return DeliveryQuote::without_free_delivery(base_fee);
    }

    let threshold = match (store.pricing_mode, selected_zone) {
        (PricingMode::Fixed, _) => store.global_free_delivery_min_amount,
        (PricingMode::ByZone, Some(zone)) => {
            if !zone.free_delivery_enabled {
                // Zone explicitly excluded, even when a global threshold exists.
                return DeliveryQuote::without_free_delivery(base_fee);
            }
            zone.free_delivery_min_amount
                .or(store.global_free_delivery_min_amount)
        }
        // Cannot evaluate free delivery until a zone is picked.
        (PricingMode::ByZone, None) => None,
    };

    let Some(threshold) = threshold.filter(|t| !t.is_zero()) else {
        return DeliveryQuote::without_free_delivery(base_fee);
    };

    let amount_needed = cart_total.gap_to(threshold);
    let is_free = amount_needed.is_none();
    DeliveryQuote {
        delivery_fee: if is_free { Price::ZERO } else { base_fee },
        is_free_delivery: is_free,
        amount_needed_for_free_delivery: amount_needed,
        free_delivery_threshold: Some(threshold),
        can_have_free_delivery: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn price(units: i64, scale: u32) -> Price {
        Price::new(Decimal::new(units, scale))
    }

    fn fixed_store(fixed: i64, enabled: bool, min: Option<i64>) -> StoreDeliveryConfig {
        StoreDeliveryConfig {
            pricing_mode: PricingMode::Fixed,
            fixed_price: price(fixed, 0),
            free_delivery_enabled: enabled,
            global_free_delivery_min_amount: min.map(|m| price(m, 0)),
        }
    }

    fn zone(delivery: i64, enabled: bool, min: Option<i64>) -> DeliveryZone {
        DeliveryZone {
            id: Uuid::new_v4(),
            name: "Centro".into(),
            delivery_price: price(delivery, 0),
            free_delivery_enabled: enabled,
            free_delivery_min_amount: min.map(|m| price(m, 0)),
        }
    }

    #[test]
    fn missing_store_short_circuits() {
        let q = quote(None, None, price(100, 0));
        assert_eq!(q, DeliveryQuote::without_free_delivery(Price::ZERO));
    }

    #[test]
    fn store_level_disable_wins_over_everything() {
        let store = fixed_store(5, false, Some(10));
        let q = quote(Some(&store), None, price(1000, 0));
        assert!(!q.is_free_delivery);
        assert!(!q.can_have_free_delivery);
        assert_eq!(q.delivery_fee, price(5, 0));
        assert_eq!(q.free_delivery_threshold, None);
    }

    #[test]
    fn threshold_equality_qualifies() {
        let store = fixed_store(5, true, Some(50));
        let q = quote(Some(&store), None, price(50, 0));
        assert!(q.is_free_delivery);
        assert!(q.can_have_free_delivery);
        assert_eq!(q.delivery_fee, Price::ZERO);
        assert_eq!(q.amount_needed_for_free_delivery, None);
        assert_eq!(q.free_delivery_threshold, Some(price(50, 0)));
    }

    #[test]
    fn one_cent_short_of_threshold() {
        let store = fixed_store(5, true, Some(50));
        let q = quote(Some(&store), None, price(4999, 2));
        assert!(!q.is_free_delivery);
        assert_eq!(q.delivery_fee, price(5, 0));
        assert_eq!(q.amount_needed_for_free_delivery, Some(price(1, 2)));
        assert_eq!(q.free_delivery_threshold, Some(price(50, 0)));
        assert!(q.can_have_free_delivery);
    }

    #[test]
    fn missing_or_zero_threshold_is_unreachable() {
        let store = fixed_store(5, true, None);
        let q = quote(Some(&store), None, price(1000, 0));
        assert!(!q.can_have_free_delivery);
        assert_eq!(q.delivery_fee, price(5, 0));

        let store = fixed_store(5, true, Some(0));
        let q = quote(Some(&store), None, price(1000, 0));
        assert!(!q.can_have_free_delivery);
    }

    #[test]
    fn excluded_zone_never_free_despite_global_threshold() {
        let store = StoreDeliveryConfig {
            pricing_mode: PricingMode::ByZone,
            fixed_price: Price::ZERO,
            free_delivery_enabled: true,
            global_free_delivery_min_amount: Some(price(30, 0)),
        };
        let zone = zone(8, false, None);
        let q = quote(Some(&store), Some(&zone), price(100, 0));
        assert!(!q.is_free_delivery);
        assert!(!q.can_have_free_delivery);
        assert_eq!(q.delivery_fee, price(8, 0));
        assert_eq!(q.free_delivery_threshold, None);
        assert_eq!(q.amount_needed_for_free_delivery, None);
    }

    #[test]
    fn zone_threshold_overrides_global() {
        let store = StoreDeliveryConfig {
            pricing_mode: PricingMode::ByZone,
            fixed_price: Price::ZERO,
            free_delivery_enabled: true,
            global_free_delivery_min_amount: Some(price(30, 0)),
        };
        let near = zone(4, true, Some(20));
        let q = quote(Some(&store), Some(&near), price(25, 0));
        assert!(q.is_free_delivery);
        assert_eq!(q.free_delivery_threshold, Some(price(20, 0)));

        // Same cart against a zone that falls back to the global threshold:
        // the quote is rebuilt from scratch, no state leaks between zones.
        let far = zone(9, true, None);
        let q = quote(Some(&store), Some(&far), price(25, 0));
        assert!(!q.is_free_delivery);
        assert_eq!(q.delivery_fee, price(9, 0));
        assert_eq!(q.free_delivery_threshold, Some(price(30, 0)));
        assert_eq!(q.amount_needed_for_free_delivery, Some(price(5, 0)));
    }

    #[test]
    fn by_zone_without_zone_has_zero_fee_and_no_threshold() {
        let store = StoreDeliveryConfig {
            pricing_mode: PricingMode::ByZone,
            fixed_price: price(7, 0),
            free_delivery_enabled: true,
            global_free_delivery_min_amount: Some(price(30, 0)),
        };
        let q = quote(Some(&store), None, price(100, 0));
        assert_eq!(q.delivery_fee, Price::ZERO);
        assert!(!q.can_have_free_delivery);
        assert_eq!(q.free_delivery_threshold, None);
    }

    #[test]
    fn zero_fixed_price_is_a_real_fee() {
        let store = fixed_store(0, true, Some(50));
        let q = quote(Some(&store), None, price(10, 0));
        assert_eq!(q.delivery_fee, Price::ZERO);
        assert!(!q.is_free_delivery); // fee happens to be zero, cart did not qualify
        assert!(q.can_have_free_delivery);
    }
}
