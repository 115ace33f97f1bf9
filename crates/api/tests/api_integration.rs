//! Integration tests for the API server.

use std::sync::OnceLock;

use api::config::Config;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use event_store::InMemoryEventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> Router {
    let state = api::create_default_state(InMemoryEventStore::new(), &Config::default());
    api::create_app(state, get_metrics_handle())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&body).into_owned())
        })
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn with_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn place_order(app: &Router) -> String {
    let (status, json) = send(
        app,
        with_json(
            "POST",
            "/orders",
            json!({
                "items": [{
                    "product_id": "SKU-001",
                    "product_name": "Widget",
                    "quantity": 2,
                    "unit_price_cents": 1000
                }]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["order_id"].as_str().unwrap().to_string()
}

async fn set_status(app: &Router, order_id: &str, body: Value) -> (StatusCode, Value) {
    send(
        app,
        with_json("PATCH", &format!("/orders/{order_id}/status"), body),
    )
    .await
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let (status, json) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_place_order_starts_pending() {
    let app = setup();
    let (status, json) = send(
        &app,
        with_json(
            "POST",
            "/orders",
            json!({
                "customer_id": "0b6f4cf5-3c6d-4b39-9f0e-5f1d2a0d9e11",
                "items": [{
                    "product_id": "SKU-001",
                    "product_name": "Widget",
                    "quantity": 1,
                    "unit_price_cents": 1500
                }]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["status"], "PENDING");
    assert_eq!(json["version"], 1);
    assert!(json["order_id"].as_str().is_some());
}

#[tokio::test]
async fn test_place_order_validation() {
    let app = setup();

    let (status, json) = send(&app, with_json("POST", "/orders", json!({ "items": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().is_some());

    let (status, _) = send(
        &app,
        with_json(
            "POST",
            "/orders",
            json!({ "customer_id": "not-a-uuid", "items": [] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(&app, with_json("POST", "/orders", json!({ "nope": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn test_get_order() {
    let app = setup();
    let order_id = place_order(&app).await;

    let (status, json) = send(&app, get(&format!("/orders/{order_id}"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], order_id.as_str());
    assert_eq!(json["status"], "PENDING");
    assert_eq!(json["terminal"], false);
    assert_eq!(json["total_cents"], 2000);
    assert_eq!(json["allowed_transitions"], json!(["CONFIRMED", "CANCELLED"]));
}

#[tokio::test]
async fn test_get_unknown_order_is_404() {
    let app = setup();
    let (status, json) = send(
        &app,
        get("/orders/00000000-0000-0000-0000-000000000000"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().is_some());

    let (status, _) = send(&app, get("/orders/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_forward_status_updates() {
    let app = setup();
    let order_id = place_order(&app).await;

    for (next, version) in [
        ("CONFIRMED", 2),
        ("PROCESSING", 3),
        ("SHIPPED", 4),
        ("OUT_FOR_DELIVERY", 5),
        ("DELIVERED", 6),
    ] {
        let (status, json) = set_status(&app, &order_id, json!({ "status": next })).await;
        assert_eq!(status, StatusCode::OK, "moving to {next}: {json}");
        assert_eq!(json["status"], next);
        assert_eq!(json["version"], version);
    }

    let (_, json) = send(&app, get(&format!("/orders/{order_id}"))).await;
    assert_eq!(json["terminal"], true);
    assert_eq!(json["allowed_transitions"], json!(["RETURNED"]));
}

#[tokio::test]
async fn test_illegal_transition_is_conflict() {
    let app = setup();
    let order_id = place_order(&app).await;

    let (status, json) = set_status(&app, &order_id, json!({ "status": "SHIPPED" })).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "cannot move from PENDING to SHIPPED");

    let (_, json) = send(&app, get(&format!("/orders/{order_id}"))).await;
    assert_eq!(json["status"], "PENDING");
    assert_eq!(json["version"], 1);
}

#[tokio::test]
async fn test_unknown_status_is_bad_request() {
    let app = setup();
    let order_id = place_order(&app).await;

    let (status, json) = set_status(&app, &order_id, json!({ "status": "SHIPPING" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("SHIPPING"));

    // Names are case-sensitive.
    let (status, _) = set_status(&app, &order_id, json!({ "status": "confirmed" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_unknown_order_is_404() {
    let app = setup();
    let (status, _) = set_status(
        &app,
        "00000000-0000-0000-0000-000000000000",
        json!({ "status": "CONFIRMED" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stale_expected_version_is_conflict() {
    let app = setup();
    let order_id = place_order(&app).await;

    let (status, _) = set_status(
        &app,
        &order_id,
        json!({ "status": "CONFIRMED", "expected_version": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = set_status(
        &app,
        &order_id,
        json!({ "status": "CANCELLED", "expected_version": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("Stale version"));
}

#[tokio::test]
async fn test_non_positive_expected_version_is_bad_request() {
    let app = setup();
    let order_id = place_order(&app).await;

    for version in [0, -3] {
        let (status, json) = set_status(
            &app,
            &order_id,
            json!({ "status": "CONFIRMED", "expected_version": version }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("expected_version"));
    }

    let (_, json) = send(&app, get(&format!("/orders/{order_id}"))).await;
    assert_eq!(json["status"], "PENDING");
}

#[tokio::test]
async fn test_history_records_reasons() {
    let app = setup();
    let order_id = place_order(&app).await;

    set_status(
        &app,
        &order_id,
        json!({ "status": "CANCELLED", "reason": "customer request" }),
    )
    .await;
    set_status(&app, &order_id, json!({ "status": "REFUNDED" })).await;

    let (status, json) = send(&app, get(&format!("/orders/{order_id}/history"))).await;

    assert_eq!(status, StatusCode::OK);
    let history = json.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["from"], "PENDING");
    assert_eq!(history[0]["to"], "CANCELLED");
    assert_eq!(history[0]["reason"], "customer request");
    assert_eq!(history[1]["from"], "CANCELLED");
    assert_eq!(history[1]["to"], "REFUNDED");
}

#[tokio::test]
async fn test_list_orders_by_status() {
    let app = setup();
    let confirmed = place_order(&app).await;
    let _pending = place_order(&app).await;
    set_status(&app, &confirmed, json!({ "status": "CONFIRMED" })).await;

    let (status, json) = send(&app, get("/orders")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 2);

    let (_, json) = send(&app, get("/orders?status=CONFIRMED")).await;
    let orders = json.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], confirmed.as_str());

    let (status, _) = send(&app, get("/orders?status=LOST")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_vocabulary() {
    let app = setup();
    let (status, json) = send(&app, get("/statuses")).await;

    assert_eq!(status, StatusCode::OK);
    let statuses = json.as_array().unwrap();
    assert_eq!(statuses.len(), 9);
    assert_eq!(statuses[0]["status"], "PENDING");
    assert_eq!(statuses[0]["initial"], true);

    let terminal: Vec<_> = statuses
        .iter()
        .filter(|s| s["terminal"] == true)
        .map(|s| s["status"].as_str().unwrap())
        .collect();
    assert_eq!(terminal, vec!["DELIVERED", "CANCELLED", "RETURNED", "REFUNDED"]);

    let edges: usize = statuses
        .iter()
        .map(|s| s["allowed_transitions"].as_array().unwrap().len())
        .sum();
    assert_eq!(edges, 11);
}

#[tokio::test]
async fn test_status_transitions_endpoint() {
    let app = setup();

    let (status, json) = send(&app, get("/statuses/SHIPPED/transitions")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["allowed_transitions"], json!(["OUT_FOR_DELIVERY"]));

    let (_, json) = send(&app, get("/statuses/REFUNDED/transitions")).await;
    assert_eq!(json["allowed_transitions"], json!([]));

    let (status, json) = send(&app, get("/statuses/UNKNOWN/transitions")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn test_metrics_after_transitions() {
    let app = setup();
    let order_id = place_order(&app).await;
    set_status(&app, &order_id, json!({ "status": "CONFIRMED" })).await;
    set_status(&app, &order_id, json!({ "status": "DELIVERED" })).await;

    let (status, body) = send(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);

    let text = body.as_str().unwrap();
    assert!(text.contains("orders_placed_total"));
    assert!(text.contains("order_status_transitions_total"));
    assert!(text.contains("order_status_rejections_total"));
}
