//! MenuFlow - Multi-tenant Restaurant Ordering Backend
//!
//! Decision logic and HTTP backend for a digital menu / ordering platform.
//!
//! ## Features
//! - Delivery fee and free-delivery eligibility (fixed or per-zone pricing)
//! - Order tracking timeline and ETA estimation
//! - WhatsApp notification lifecycle (templating, vendor webhook receipts)
//! - Campaign delivery counters

pub mod domain;

pub use domain::delivery::{quote, DeliveryQuote, DeliveryZone, PricingMode, StoreDeliveryConfig};
pub use domain::messaging::MessageStatus;
pub use domain::tracking::OrderStatus;
pub use domain::value_objects::Price;
