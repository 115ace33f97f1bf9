//! Domain layer for order lifecycle management.
//!
//! This crate provides:
//! - Aggregate and DomainEvent traits for event-sourced entities
//! - CommandHandler, which loads an aggregate, runs a command and appends
//!   the resulting events with optimistic concurrency
//! - The Order aggregate, whose status changes are validated against the
//!   lifecycle rules, and the OrderService that drives it

pub mod aggregate;
pub mod command;
pub mod error;
pub mod order;

pub use aggregate::{Aggregate, DomainEvent};
pub use command::{CommandHandler, CommandResult};
pub use error::DomainError;
pub use lifecycle::{IllegalTransitionError, InvalidStatusError, OrderStatus};
pub use order::{
    DEFAULT_CONFLICT_RETRIES, Money, Order, OrderError, OrderEvent, OrderItem, OrderService,
    PlaceOrder, ProductId, StatusChange, UpdateStatus,
};
