//! Identifiers shared across the order lifecycle workspace.

mod ids;

pub use ids::{AggregateId, CustomerId};
