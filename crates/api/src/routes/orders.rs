//! Order placement, lookup and status endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{AggregateId, CustomerId};
use domain::{
    Aggregate, Money, Order, OrderItem, OrderService, OrderStatus, PlaceOrder, StatusChange,
    UpdateStatus,
};
use event_store::{EventStore, Version};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: EventStore> {
    pub order_service: OrderService<S>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub customer_id: Option<String>,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

/// Body of `PATCH /orders/{id}/status`.
///
/// `status` is taken as text so that an unknown name is reported as an
/// invalid status rather than a generic body error.
#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub reason: Option<String>,
    pub expected_version: Option<i64>,
}

#[derive(Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub customer_id: String,
    pub status: OrderStatus,
    pub terminal: bool,
    pub allowed_transitions: Vec<OrderStatus>,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
    pub version: i64,
    pub placed_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Serialize)]
pub struct OrderPlacedResponse {
    pub order_id: String,
    pub status: OrderStatus,
    pub version: i64,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().map(|id| id.to_string()).unwrap_or_default(),
            customer_id: order
                .customer_id()
                .map(|c| c.to_string())
                .unwrap_or_default(),
            status: order.status(),
            terminal: order.is_terminal(),
            allowed_transitions: order.allowed_transitions(),
            items: order
                .items()
                .iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id.to_string(),
                    product_name: item.product_name.clone(),
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price.cents(),
                })
                .collect(),
            total_cents: order.total_amount().cents(),
            version: order.version().as_i64(),
            placed_at: order.placed_at(),
            updated_at: order.updated_at(),
        }
    }
}

// -- Handlers --

/// POST /orders: place a new order in the initial status.
#[tracing::instrument(skip(state, body))]
pub async fn create<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderPlacedResponse>), ApiError> {
    let Json(req) = body?;

    let customer_id = match req.customer_id.as_deref() {
        Some(id) => CustomerId::parse(id)
            .map_err(|e| ApiError::BadRequest(format!("Invalid customer_id: {e}")))?,
        None => CustomerId::new(),
    };

    let items = req
        .items
        .into_iter()
        .map(|item| {
            OrderItem::new(
                item.product_id,
                item.product_name,
                item.quantity,
                Money::from_cents(item.unit_price_cents),
            )
        })
        .collect();

    let cmd = PlaceOrder::for_customer(customer_id, items);
    let order_id = cmd.order_id;
    let result = state.order_service.place_order(cmd).await?;

    let response = OrderPlacedResponse {
        order_id: order_id.to_string(),
        status: result.aggregate.status(),
        version: result.new_version.as_i64(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /orders/{id}: load an order by ID.
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .order_service
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;

    Ok(Json(OrderResponse::from(&order)))
}

/// GET /orders: list orders, optionally filtered with `?status=`.
#[tracing::instrument(skip(state, query))]
pub async fn list<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<ListOrdersQuery>, QueryRejection>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let Query(query) = query?;
    let status = query
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()?;

    let orders = state.order_service.list_orders(status).await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// PATCH /orders/{id}/status: move an order to a new status.
#[tracing::instrument(skip(state, body))]
pub async fn update_status<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let Json(req) = body?;
    let next: OrderStatus = req.status.parse()?;

    let mut cmd = UpdateStatus::new(order_id, next);
    if let Some(reason) = req.reason {
        cmd = cmd.with_reason(reason);
    }
    if let Some(version) = req.expected_version {
        if version < Version::first().as_i64() {
            return Err(ApiError::BadRequest(format!(
                "Invalid expected_version: {version} (must be at least 1)"
            )));
        }
        cmd = cmd.expecting(Version::new(version));
    }

    let result = state.order_service.update_status(cmd).await?;
    Ok(Json(OrderResponse::from(&result.aggregate)))
}

/// GET /orders/{id}/history: accepted status changes, oldest first.
#[tracing::instrument(skip(state))]
pub async fn history<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<StatusChange>>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let history = state.order_service.status_history(order_id).await?;
    Ok(Json(history))
}

fn parse_order_id(id: &str) -> Result<AggregateId, ApiError> {
    AggregateId::parse(id).map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
