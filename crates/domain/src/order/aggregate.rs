//! Order aggregate implementation.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use common::{AggregateId, CustomerId};
use event_store::Version;
use lifecycle::{OrderStatus, validate_transition};

use crate::aggregate::Aggregate;

use super::{
    Money, OrderError, OrderEvent, OrderItem, StatusChange,
    events::{OrderPlacedData, StatusChangedData},
};

/// Order aggregate root.
///
/// Holds exactly one current status at a time. Every status change goes
/// through the lifecycle rules before an event is produced, and the command
/// handler only persists that event if no other change landed in between.
#[derive(Debug, Clone, Default)]
pub struct Order {
    id: Option<AggregateId>,
    version: Version,
    customer_id: Option<CustomerId>,
    status: OrderStatus,
    items: Vec<OrderItem>,
    total_amount: Money,
    placed_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    history: Vec<StatusChange>,
}

impl Aggregate for Order {
    type Event = OrderEvent;
    type Error = OrderError;

    fn aggregate_type() -> &'static str {
        "Order"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            OrderEvent::OrderPlaced(data) => self.apply_order_placed(data),
            OrderEvent::StatusChanged(data) => self.apply_status_changed(data),
        }
    }
}

// Query methods
impl Order {
    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn placed_at(&self) -> Option<DateTime<Utc>> {
        self.placed_at
    }

    /// Time of the last accepted event.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Accepted status changes, oldest first.
    pub fn history(&self) -> &[StatusChange] {
        &self.history
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Statuses this order may move to next.
    pub fn allowed_transitions(&self) -> Vec<OrderStatus> {
        lifecycle::allowed_transitions(self.status)
    }
}

// Command methods (return events)
impl Order {
    /// Places a new order. The order starts in the initial status.
    pub fn place(
        &self,
        order_id: AggregateId,
        customer_id: CustomerId,
        items: Vec<OrderItem>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_some() {
            return Err(OrderError::AlreadyPlaced);
        }

        if items.is_empty() {
            return Err(OrderError::NoItems);
        }

        let mut seen = HashSet::new();
        for item in &items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    quantity: item.quantity,
                });
            }
            if !item.unit_price.is_positive() {
                return Err(OrderError::InvalidPrice {
                    price: item.unit_price.cents(),
                });
            }
            if !seen.insert(&item.product_id) {
                return Err(OrderError::DuplicateItem {
                    product_id: item.product_id.to_string(),
                });
            }
        }

        Ok(vec![OrderEvent::order_placed(order_id, customer_id, items)])
    }

    /// Moves the order to `next` if the lifecycle allows it.
    pub fn change_status(
        &self,
        next: OrderStatus,
        reason: Option<String>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_none() {
            return Err(OrderError::NotPlaced);
        }

        validate_transition(self.status, next)?;

        Ok(vec![OrderEvent::status_changed(self.status, next, reason)])
    }
}

// Apply event helpers
impl Order {
    fn apply_order_placed(&mut self, data: OrderPlacedData) {
        self.id = Some(data.order_id);
        self.customer_id = Some(data.customer_id);
        self.status = OrderStatus::initial();
        self.items = data.items;
        self.total_amount = data.total_amount;
        self.placed_at = Some(data.placed_at);
        self.updated_at = Some(data.placed_at);
    }

    fn apply_status_changed(&mut self, data: StatusChangedData) {
        self.status = data.to;
        self.updated_at = Some(data.changed_at);
        self.history.push(StatusChange {
            from: data.from,
            to: data.to,
            reason: data.reason,
            changed_at: data.changed_at,
        });
    }
}
