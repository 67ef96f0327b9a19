//! Value objects shared across the ordering domain

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-negative monetary amount.
///
/// Prices, cart totals and thresholds are clamped to zero at construction;
/// the pure calculators downstream never see a negative amount. A zero price
/// is legal (a store may genuinely charge nothing for base delivery).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Price = Price(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount.max(Decimal::ZERO))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Amount still missing to reach `target`, `None` once reached.
    pub fn gap_to(&self, target: Price) -> Option<Price> {
        if self.0 >= target.0 {
            None
        } else {
            Some(Price(target.0 - self.0))
        }
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl Default for Price {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_amounts_clamp_to_zero() {
        assert_eq!(Price::new(Decimal::new(-5, 0)), Price::ZERO);
        assert!(Price::new(Decimal::new(-1, 2)).is_zero());
    }

    #[test]
    fn gap_to_threshold() {
        let cart = Price::new(Decimal::new(4999, 2));
        let threshold = Price::new(Decimal::new(50, 0));
        assert_eq!(cart.gap_to(threshold), Some(Price::new(Decimal::new(1, 2))));
        assert_eq!(threshold.gap_to(threshold), None);
    }
}
