//! Read-only view of the order status vocabulary and its transitions.

use axum::Json;
use axum::extract::Path;
use domain::OrderStatus;
use serde::Serialize;

use crate::error::ApiError;

#[derive(Serialize)]
pub struct StatusInfo {
    pub status: OrderStatus,
    pub initial: bool,
    pub terminal: bool,
    pub allowed_transitions: Vec<OrderStatus>,
}

impl From<OrderStatus> for StatusInfo {
    fn from(status: OrderStatus) -> Self {
        Self {
            status,
            initial: status == OrderStatus::initial(),
            terminal: status.is_terminal(),
            allowed_transitions: lifecycle::allowed_transitions(status),
        }
    }
}

/// GET /statuses: every status with its classification and outgoing edges.
pub async fn list() -> Json<Vec<StatusInfo>> {
    Json(OrderStatus::ALL.into_iter().map(StatusInfo::from).collect())
}

/// GET /statuses/{status}/transitions
pub async fn transitions(Path(status): Path<String>) -> Result<Json<StatusInfo>, ApiError> {
    let status: OrderStatus = status.parse()?;
    Ok(Json(StatusInfo::from(status)))
}
