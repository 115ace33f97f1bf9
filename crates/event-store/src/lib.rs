//! Event storage for order streams.
//!
//! Each order is an append-only stream of events. Writers state the version
//! they read; an append against any other version is rejected, which gives
//! every stream a single-writer discipline without locks held across I/O.

pub mod error;
pub mod event;
pub mod memory;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Version};
pub use memory::InMemoryEventStore;
pub use store::{AppendOptions, EventStore};
