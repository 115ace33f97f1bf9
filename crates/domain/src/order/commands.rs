//! Order commands.

use common::{AggregateId, CustomerId};
use event_store::Version;
use lifecycle::OrderStatus;

use super::OrderItem;

/// Command to place a new order.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub order_id: AggregateId,
    pub customer_id: CustomerId,
    pub items: Vec<OrderItem>,
}

impl PlaceOrder {
    pub fn new(order_id: AggregateId, customer_id: CustomerId, items: Vec<OrderItem>) -> Self {
        Self {
            order_id,
            customer_id,
            items,
        }
    }

    /// Creates a PlaceOrder command with a generated order ID.
    pub fn for_customer(customer_id: CustomerId, items: Vec<OrderItem>) -> Self {
        Self::new(AggregateId::new(), customer_id, items)
    }
}

/// Command to move an order to a new status.
#[derive(Debug, Clone)]
pub struct UpdateStatus {
    pub order_id: AggregateId,

    /// Requested next status.
    pub status: OrderStatus,

    pub reason: Option<String>,

    /// Version the caller based the request on. When set, the update is
    /// refused if the order has moved on, and no automatic retry happens.
    pub expected_version: Option<Version>,
}

impl UpdateStatus {
    pub fn new(order_id: AggregateId, status: OrderStatus) -> Self {
        Self {
            order_id,
            status,
            reason: None,
            expected_version: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn expecting(mut self, version: Version) -> Self {
        self.expected_version = Some(version);
        self
    }
}
