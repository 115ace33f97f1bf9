//! Order lifecycle rules.
//!
//! This crate owns the canonical order status vocabulary and decides whether
//! a proposed status change is legal:
//! - [`OrderStatus`], the closed set of nine statuses
//! - [`is_valid_transition`] and [`is_terminal`], the pure decision functions
//! - [`check_transition`], the same decision over unparsed status names
//!
//! Nothing here performs I/O or holds state; every function can be called
//! from any thread or task without coordination.

pub mod error;
pub mod status;
pub mod transition;

pub use error::{IllegalTransitionError, InvalidStatusError};
pub use status::OrderStatus;
pub use transition::{
    POST_TERMINAL, TRANSITIONS, allowed_transitions, check_transition, is_terminal,
    is_valid_transition, successor, validate_transition,
};
