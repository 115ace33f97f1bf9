//! Order domain events.

use chrono::{DateTime, Utc};
use common::{AggregateId, CustomerId};
use lifecycle::OrderStatus;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{Money, OrderItem};

/// Events that can occur on an order aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// Order was placed; it starts in the initial status.
    OrderPlaced(OrderPlacedData),

    /// Order moved to a new status.
    StatusChanged(StatusChangedData),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => Self::ORDER_PLACED,
            OrderEvent::StatusChanged(_) => Self::STATUS_CHANGED,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacedData {
    pub order_id: AggregateId,
    pub customer_id: CustomerId,
    pub items: Vec<OrderItem>,
    pub total_amount: Money,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangedData {
    /// Status the order was in when the change was decided.
    pub from: OrderStatus,
    pub to: OrderStatus,
    /// Free-text reason supplied by the caller (e.g. a cancellation reason).
    pub reason: Option<String>,
    pub changed_at: DateTime<Utc>,
}

impl OrderEvent {
    pub const ORDER_PLACED: &'static str = "OrderPlaced";
    pub const STATUS_CHANGED: &'static str = "StatusChanged";

    pub fn order_placed(
        order_id: AggregateId,
        customer_id: CustomerId,
        items: Vec<OrderItem>,
    ) -> Self {
        let total_amount = items.iter().map(OrderItem::total_price).sum();
        OrderEvent::OrderPlaced(OrderPlacedData {
            order_id,
            customer_id,
            items,
            total_amount,
            placed_at: Utc::now(),
        })
    }

    pub fn status_changed(from: OrderStatus, to: OrderStatus, reason: Option<String>) -> Self {
        OrderEvent::StatusChanged(StatusChangedData {
            from,
            to,
            reason,
            changed_at: Utc::now(),
        })
    }
}
