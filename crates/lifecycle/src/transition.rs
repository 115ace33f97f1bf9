//! The legal-transition relation between order statuses.

use crate::{IllegalTransitionError, InvalidStatusError, OrderStatus};

/// Every legal `(from, to)` pair.
///
/// The forward chain, cancellation before shipment, return after delivery and
/// refund after cancellation or return. Pairs not listed here are illegal.
pub const TRANSITIONS: &[(OrderStatus, OrderStatus)] = &[
    (OrderStatus::Pending, OrderStatus::Confirmed),
    (OrderStatus::Confirmed, OrderStatus::Processing),
    (OrderStatus::Processing, OrderStatus::Shipped),
    (OrderStatus::Shipped, OrderStatus::OutForDelivery),
    (OrderStatus::OutForDelivery, OrderStatus::Delivered),
    (OrderStatus::Pending, OrderStatus::Cancelled),
    (OrderStatus::Confirmed, OrderStatus::Cancelled),
    (OrderStatus::Processing, OrderStatus::Cancelled),
    (OrderStatus::Delivered, OrderStatus::Returned),
    (OrderStatus::Cancelled, OrderStatus::Refunded),
    (OrderStatus::Returned, OrderStatus::Refunded),
];

/// Transitions out of a terminal status that are nevertheless legal.
///
/// `is_terminal` reports these sources as terminal while the table above
/// allows one outbound edge from each. Both rules are kept as observed; the
/// terminal check only applies to pairs outside this list.
pub const POST_TERMINAL: &[(OrderStatus, OrderStatus)] = &[
    (OrderStatus::Delivered, OrderStatus::Returned),
    (OrderStatus::Cancelled, OrderStatus::Refunded),
    (OrderStatus::Returned, OrderStatus::Refunded),
];

/// Returns true if `status` is one of `DELIVERED`, `CANCELLED`, `RETURNED`, `REFUNDED`.
pub fn is_terminal(status: OrderStatus) -> bool {
    status.is_terminal()
}

/// Decides whether an order may move from `current` to `next`.
///
/// Self-transitions and stage skips are never legal.
pub fn is_valid_transition(current: OrderStatus, next: OrderStatus) -> bool {
    let pair = (current, next);
    // Redundant with the table today; states the terminal rule explicitly.
    if current.is_terminal() && !POST_TERMINAL.contains(&pair) {
        return false;
    }
    TRANSITIONS.contains(&pair)
}

/// Like [`is_valid_transition`], but reports an illegal move as an error.
pub fn validate_transition(
    current: OrderStatus,
    next: OrderStatus,
) -> Result<(), IllegalTransitionError> {
    if is_valid_transition(current, next) {
        Ok(())
    } else {
        Err(IllegalTransitionError {
            from: current,
            to: next,
        })
    }
}

/// Decides a transition given unparsed status names.
///
/// An unrecognised name on either side is an [`InvalidStatusError`]; a
/// recognised but forbidden pair is `Ok(false)`.
pub fn check_transition(current: &str, next: &str) -> Result<bool, InvalidStatusError> {
    let current: OrderStatus = current.parse()?;
    let next: OrderStatus = next.parse()?;
    Ok(is_valid_transition(current, next))
}

/// Returns the next status on the forward chain, if any.
pub fn successor(status: OrderStatus) -> Option<OrderStatus> {
    OrderStatus::FORWARD
        .windows(2)
        .find(|pair| pair[0] == status)
        .map(|pair| pair[1])
}

/// Returns every status reachable from `status` in one legal step.
pub fn allowed_transitions(status: OrderStatus) -> Vec<OrderStatus> {
    OrderStatus::ALL
        .into_iter()
        .filter(|next| is_valid_transition(status, *next))
        .collect()
}
