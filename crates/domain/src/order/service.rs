//! Order service: placement, status updates and lookups.

use common::AggregateId;
use event_store::{EventStore, EventStoreError};
use lifecycle::OrderStatus;

use crate::aggregate::Aggregate;
use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{Order, OrderError, OrderEvent, PlaceOrder, StatusChange, UpdateStatus};

/// Default number of times a status update is re-read and re-validated after
/// losing a race to another writer.
pub const DEFAULT_CONFLICT_RETRIES: u32 = 3;

/// Service for managing orders.
///
/// `update_status` is the update path for order statuses: it re-reads the
/// order, validates the requested transition against the current status and
/// appends the change only if the order is still at the version it read.
pub struct OrderService<S: EventStore> {
    handler: CommandHandler<S, Order>,
    conflict_retries: u32,
}

impl<S: EventStore> OrderService<S> {
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
            conflict_retries: DEFAULT_CONFLICT_RETRIES,
        }
    }

    /// Sets how many times a conflicting update is retried against fresh state.
    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.conflict_retries = retries;
        self
    }

    pub fn handler(&self) -> &CommandHandler<S, Order> {
        &self.handler
    }

    /// Places a new order in the initial status.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<CommandResult<Order>, DomainError> {
        let PlaceOrder {
            order_id,
            customer_id,
            items,
        } = cmd;

        let result = self
            .handler
            .execute(order_id, None, |order| {
                order.place(order_id, customer_id, items)
            })
            .await?;

        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(%customer_id, total = %result.aggregate.total_amount(), "order placed");
        Ok(result)
    }

    /// Moves an order to a new status.
    ///
    /// Validation always runs against the status read in the same attempt
    /// that appends. If another writer gets in first the append fails; when
    /// the caller did not pin a version the service reloads and decides
    /// again, up to the configured number of retries.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id, to = %cmd.status))]
    pub async fn update_status(
        &self,
        cmd: UpdateStatus,
    ) -> Result<CommandResult<Order>, DomainError> {
        let mut attempt = 0;
        loop {
            let reason = cmd.reason.clone();
            let result = self
                .handler
                .execute(cmd.order_id, cmd.expected_version, |order| {
                    order.change_status(cmd.status, reason)
                })
                .await;

            match result {
                Ok(result) => {
                    self.record_accepted(&result);
                    return Ok(result);
                }
                Err(DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. }))
                    if cmd.expected_version.is_none() && attempt < self.conflict_retries =>
                {
                    attempt += 1;
                    metrics::counter!("order_status_conflicts_total").increment(1);
                    tracing::warn!(attempt, "status update lost a race, re-reading order");
                }
                Err(DomainError::Order(OrderError::NotPlaced)) => {
                    return Err(DomainError::AggregateNotFound {
                        aggregate_type: Order::aggregate_type(),
                        aggregate_id: cmd.order_id,
                    });
                }
                Err(err) => {
                    self.record_rejected(&err);
                    return Err(err);
                }
            }
        }
    }

    /// Loads an order, returning `None` if it was never placed.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: AggregateId) -> Result<Option<Order>, DomainError> {
        self.handler.load_existing(order_id).await
    }

    /// Returns the accepted status changes of an order, oldest first.
    pub async fn status_history(
        &self,
        order_id: AggregateId,
    ) -> Result<Vec<StatusChange>, DomainError> {
        let order = self.require_order(order_id).await?;
        Ok(order.history().to_vec())
    }

    /// Lists placed orders, optionally only those currently in `status`.
    ///
    /// Orders are returned in placement order.
    pub async fn list_orders(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, DomainError> {
        let placed = self
            .handler
            .store()
            .get_events_by_type(OrderEvent::ORDER_PLACED)
            .await?;

        let mut orders = Vec::with_capacity(placed.len());
        for envelope in placed {
            let order = self.handler.load(envelope.aggregate_id).await?;
            if status.is_none_or(|s| order.status() == s) {
                orders.push(order);
            }
        }
        Ok(orders)
    }

    async fn require_order(&self, order_id: AggregateId) -> Result<Order, DomainError> {
        self.handler
            .load_existing(order_id)
            .await?
            .ok_or(DomainError::AggregateNotFound {
                aggregate_type: Order::aggregate_type(),
                aggregate_id: order_id,
            })
    }

    fn record_accepted(&self, result: &CommandResult<Order>) {
        for event in &result.events {
            if let OrderEvent::StatusChanged(data) = event {
                metrics::counter!(
                    "order_status_transitions_total",
                    "from" => data.from.as_str(),
                    "to" => data.to.as_str()
                )
                .increment(1);
                tracing::info!(
                    from = %data.from,
                    to = %data.to,
                    version = %result.new_version,
                    "order status changed"
                );
            }
        }
    }

    fn record_rejected(&self, err: &DomainError) {
        match err {
            DomainError::Order(OrderError::IllegalTransition(illegal)) => {
                metrics::counter!(
                    "order_status_rejections_total",
                    "from" => illegal.from.as_str(),
                    "to" => illegal.to.as_str()
                )
                .increment(1);
                tracing::warn!(from = %illegal.from, to = %illegal.to, "illegal status transition");
            }
            err if err.is_conflict() => {
                metrics::counter!("order_status_conflicts_total").increment(1);
                tracing::warn!(error = %err, "status update conflicted");
            }
            _ => {}
        }
    }
}
