//! HTTP route handlers.

pub mod orders;
pub mod statuses;
pub mod system;
