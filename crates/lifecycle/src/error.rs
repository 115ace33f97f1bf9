//! Lifecycle error types.

use thiserror::Error;

use crate::OrderStatus;

/// A status name that is not one of the nine recognised statuses.
///
/// Distinct from [`IllegalTransitionError`] so callers can tell malformed
/// input apart from a well-formed but forbidden transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid order status: {value:?}")]
pub struct InvalidStatusError {
    /// The rejected input, verbatim.
    pub value: String,
}

impl InvalidStatusError {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// A transition the lifecycle forbids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot move from {from} to {to}")]
pub struct IllegalTransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_transition_message_names_both_statuses() {
        let err = IllegalTransitionError {
            from: OrderStatus::Delivered,
            to: OrderStatus::Processing,
        };
        assert_eq!(err.to_string(), "cannot move from DELIVERED to PROCESSING");
    }

    #[test]
    fn invalid_status_message_quotes_input() {
        let err = InvalidStatusError::new("LOST");
        assert_eq!(err.to_string(), "invalid order status: \"LOST\"");
    }
}
