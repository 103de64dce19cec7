//! Fulfillment status of a single order item.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The state of an order item in its fulfillment pipeline.
///
/// State transitions:
/// ```text
/// Registered ──► Paid ──► Prepared ──► Shipped ──► InTransit ──► Delivered ──► Received
///     │           │          │
///     └───────────┴──────────┴──► CancelledByBuyer | CancelledBySeller
/// ```
///
/// The wire and storage representation is the snake_case token returned by
/// [`ItemStatus::as_str`]; existing consumers depend on these exact strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Item recorded at checkout, awaiting payment.
    #[default]
    Registered,

    /// Seller confirmed payment.
    Paid,

    /// Seller packed the item.
    Prepared,

    /// Handed to the carrier.
    Shipped,

    /// Carrier reports the parcel moving.
    InTransit,

    /// Carrier reports delivery.
    Delivered,

    /// Seller confirmed the buyer received it (terminal state).
    Received,

    /// Buyer withdrew the item (terminal state).
    CancelledByBuyer,

    /// Seller withdrew the item (terminal state).
    CancelledBySeller,
}

impl ItemStatus {
    /// The forward pipeline, in order.
    pub const PIPELINE: [ItemStatus; 7] = [
        ItemStatus::Registered,
        ItemStatus::Paid,
        ItemStatus::Prepared,
        ItemStatus::Shipped,
        ItemStatus::InTransit,
        ItemStatus::Delivered,
        ItemStatus::Received,
    ];

    /// Every status, pipeline first.
    pub const ALL: [ItemStatus; 9] = [
        ItemStatus::Registered,
        ItemStatus::Paid,
        ItemStatus::Prepared,
        ItemStatus::Shipped,
        ItemStatus::InTransit,
        ItemStatus::Delivered,
        ItemStatus::Received,
        ItemStatus::CancelledByBuyer,
        ItemStatus::CancelledBySeller,
    ];

    /// Returns the immediate successor in the forward pipeline.
    pub fn successor(&self) -> Option<ItemStatus> {
        match self {
            ItemStatus::Registered => Some(ItemStatus::Paid),
            ItemStatus::Paid => Some(ItemStatus::Prepared),
            ItemStatus::Prepared => Some(ItemStatus::Shipped),
            ItemStatus::Shipped => Some(ItemStatus::InTransit),
            ItemStatus::InTransit => Some(ItemStatus::Delivered),
            ItemStatus::Delivered => Some(ItemStatus::Received),
            ItemStatus::Received
            | ItemStatus::CancelledByBuyer
            | ItemStatus::CancelledBySeller => None,
        }
    }

    /// Returns true for the two cancellation exits.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            ItemStatus::CancelledByBuyer | ItemStatus::CancelledBySeller
        )
    }

    /// Returns true if the item can still be cancelled in this state.
    pub fn can_cancel(&self) -> bool {
        matches!(
            self,
            ItemStatus::Registered | ItemStatus::Paid | ItemStatus::Prepared
        )
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        self.successor().is_none()
    }

    /// Returns true if moving from `self` to `target` is a legal step,
    /// ignoring who asks for it.
    pub fn allows(&self, target: ItemStatus) -> bool {
        if target.is_cancellation() {
            self.can_cancel()
        } else {
            self.successor() == Some(target)
        }
    }

    /// Returns the status token.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Registered => "registered",
            ItemStatus::Paid => "paid",
            ItemStatus::Prepared => "prepared",
            ItemStatus::Shipped => "shipped",
            ItemStatus::InTransit => "in_transit",
            ItemStatus::Delivered => "delivered",
            ItemStatus::Received => "received",
            ItemStatus::CancelledByBuyer => "cancelled_by_buyer",
            ItemStatus::CancelledBySeller => "cancelled_by_seller",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when parsing a token that is not one of the nine status values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown item status: {0}")]
pub struct UnknownStatus(pub String);

impl std::str::FromStr for ItemStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
