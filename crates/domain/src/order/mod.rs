//! Order aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod service;
mod value_objects;

pub use aggregate::Order;
pub use commands::{PlaceOrder, UpdateStatus};
pub use events::{OrderEvent, OrderPlacedData, StatusChangedData};
pub use service::{DEFAULT_CONFLICT_RETRIES, OrderService};
pub use value_objects::{Money, OrderItem, ProductId, StatusChange};

use lifecycle::IllegalTransitionError;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The requested status change is not allowed by the lifecycle.
    #[error(transparent)]
    IllegalTransition(#[from] IllegalTransitionError),

    /// The order has not been placed yet.
    #[error("Order has not been placed")]
    NotPlaced,

    /// The order was already placed.
    #[error("Order already placed")]
    AlreadyPlaced,

    #[error("Order has no items")]
    NoItems,

    #[error("Duplicate item: {product_id}")]
    DuplicateItem { product_id: String },

    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    #[error("Invalid price: {price} (must be greater than 0)")]
    InvalidPrice { price: i64 },
}
