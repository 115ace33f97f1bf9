//! Order status vocabulary.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::InvalidStatusError;

/// The status of an order in its lifecycle.
///
/// ```text
/// PENDING ──► CONFIRMED ──► PROCESSING ──► SHIPPED ──► OUT_FOR_DELIVERY ──► DELIVERED
///    │            │              │                                              │
///    └────────────┴──────────────┴──► CANCELLED ──► REFUNDED ◄── RETURNED ◄─────┘
/// ```
///
/// `DELIVERED`, `CANCELLED`, `RETURNED` and `REFUNDED` are terminal. The
/// edges leaving `DELIVERED`, `CANCELLED` and `RETURNED` are the post-terminal
/// exceptions listed in [`crate::POST_TERMINAL`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order placed, awaiting confirmation. The only initial status.
    #[default]
    Pending,

    /// Order accepted by the seller.
    Confirmed,

    /// Order is being picked and packed.
    Processing,

    /// Handed to the carrier.
    Shipped,

    /// With the courier on the final leg.
    OutForDelivery,

    /// Received by the customer (terminal).
    Delivered,

    /// Cancelled before shipment (terminal).
    Cancelled,

    /// Sent back after delivery (terminal).
    Returned,

    /// Money returned to the customer (terminal).
    Refunded,
}

impl OrderStatus {
    /// Every status, in declaration order.
    pub const ALL: [OrderStatus; 9] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Returned,
        OrderStatus::Refunded,
    ];

    /// The happy path an order follows absent cancellation or return.
    pub const FORWARD: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    /// Returns the status every new order starts in.
    pub fn initial() -> Self {
        OrderStatus::Pending
    }

    /// Returns true if no further transition is permitted in the general case.
    pub fn is_terminal(&self) -> bool {
        match self {
            OrderStatus::Delivered
            | OrderStatus::Cancelled
            | OrderStatus::Returned
            | OrderStatus::Refunded => true,
            OrderStatus::Pending
            | OrderStatus::Confirmed
            | OrderStatus::Processing
            | OrderStatus::Shipped
            | OrderStatus::OutForDelivery => false,
        }
    }

    /// Returns the canonical status name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Returned => "RETURNED",
            OrderStatus::Refunded => "REFUNDED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = InvalidStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidStatusError::new(s))
    }
}

impl TryFrom<&str> for OrderStatus {
    type Error = InvalidStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}
