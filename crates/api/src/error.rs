//! API error types with HTTP response mapping.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, InvalidStatusError, OrderError};
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
///
/// Every variant renders as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    /// Malformed identifier, body or query string.
    #[error("{0}")]
    BadRequest(String),

    /// A status name outside the known vocabulary.
    #[error(transparent)]
    InvalidStatus(#[from] InvalidStatusError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::InvalidStatus(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::Domain(err) => domain_error_to_response(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        } else {
            tracing::debug!(%status, error = %message, "request rejected");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: &DomainError) -> (StatusCode, String) {
    match err {
        DomainError::Order(order_err) => match order_err {
            OrderError::IllegalTransition(illegal) => (StatusCode::CONFLICT, illegal.to_string()),
            OrderError::NotPlaced => (StatusCode::NOT_FOUND, order_err.to_string()),
            OrderError::AlreadyPlaced => (StatusCode::CONFLICT, order_err.to_string()),
            OrderError::NoItems
            | OrderError::DuplicateItem { .. }
            | OrderError::InvalidQuantity { .. }
            | OrderError::InvalidPrice { .. } => (StatusCode::BAD_REQUEST, order_err.to_string()),
        },
        DomainError::AggregateNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        err if err.is_conflict() => (StatusCode::CONFLICT, err.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AggregateId;
    use domain::{IllegalTransitionError, OrderStatus};
    use event_store::{EventStoreError, Version};

    #[test]
    fn test_illegal_transition_is_conflict_with_pair() {
        let err = ApiError::from(DomainError::Order(OrderError::IllegalTransition(
            IllegalTransitionError {
                from: OrderStatus::Delivered,
                to: OrderStatus::Processing,
            },
        )));
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(message, "cannot move from DELIVERED to PROCESSING");
    }

    #[test]
    fn test_invalid_status_is_bad_request() {
        let err = ApiError::from(InvalidStatusError::new("SHIPPING"));
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("SHIPPING"));
    }

    #[test]
    fn test_conflicts_map_to_409() {
        let aggregate_id = AggregateId::new();
        let stale = ApiError::from(DomainError::StaleVersion {
            aggregate_id,
            expected: Version::new(1),
            actual: Version::new(2),
        });
        let raced = ApiError::from(DomainError::EventStore(
            EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: Version::new(1),
                actual: Version::new(2),
            },
        ));

        assert_eq!(stale.status_and_message().0, StatusCode::CONFLICT);
        assert_eq!(raced.status_and_message().0, StatusCode::CONFLICT);
    }

    #[test]
    fn test_missing_order_is_not_found() {
        let err = ApiError::from(DomainError::AggregateNotFound {
            aggregate_type: "Order",
            aggregate_id: AggregateId::new(),
        });
        assert_eq!(err.status_and_message().0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_append_is_internal() {
        let err = ApiError::from(DomainError::EventStore(EventStoreError::InvalidAppend(
            "mixed aggregates".to_string(),
        )));
        assert_eq!(err.status_and_message().0, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
