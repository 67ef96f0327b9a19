//! WhatsApp message lifecycle
//!
//! A message row is created as `pending` when a send is requested and only
//! the vendor webhook advances it afterwards: `pending → sent → delivered →
//! read`, with `pending|sent → failed` as the error branch. The vendor
//! delivers events at-least-once and out of order, so every transition is
//! guarded by `admissible_from`: a status only moves forward, and terminal
//! statuses (`read`, `failed`) never change again.

pub mod phone;
pub mod template;
pub mod webhook;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Sent,
    Delivered,
    Read,
    Failed,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
            Self::Failed => "failed",
        }
    }

    /// Statuses a message may hold for this transition to apply. Used by the
    /// persistence layer as the predicate of a conditional update, which is
    /// what makes duplicate and late webhook deliveries idempotent.
    pub fn admissible_from(&self) -> &'static [MessageStatus] {
        match self {
            Self::Pending => &[],
            Self::Sent => &[Self::Pending],
            Self::Delivered => &[Self::Pending, Self::Sent],
            Self::Read => &[Self::Pending, Self::Sent, Self::Delivered],
            Self::Failed => &[Self::Pending, Self::Sent],
        }
    }

    /// Campaign aggregate column this status bumps, if any. Only terminal
    /// delivery outcomes count toward campaign stats.
    pub fn campaign_stat_column(&self) -> Option<&'static str> {
        match self {
            Self::Delivered => Some("messages_delivered"),
            Self::Failed => Some("messages_failed"),
            _ => None,
        }
    }
}
