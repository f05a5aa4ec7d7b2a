//! End-to-end tests for the order lifecycle over the management endpoints:
//! fulfillment transitions, the cancellation policy, and payout freezing.

mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

use orderflow_api::models::{Order, OrderItem};

async fn seed_paid_order(app: &TestApp, total: rust_decimal::Decimal) -> Order {
    let orders = &app.state.services.orders;
    let order = orders
        .create_order(
            vec![OrderItem {
                product_id: "prod-1".to_string(),
                title: "Widget".to_string(),
                unit_price: total,
                quantity: 1,
            }],
            total,
        )
        .await
        .expect("seed order");
    orders.mark_paid(order.id).await.expect("mark paid")
}

#[tokio::test]
async fn full_fulfillment_flow_freezes_payout_at_completion() {
    let app = TestApp::new().await;
    let order = seed_paid_order(&app, dec!(200.00)).await;

    let (status, body) = app
        .request_json(
            Method::POST,
            &format!("/api/v1/orders/{}/ship", order.id),
            Some(json!({"tracking_number": "TRK-100"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "shipped");
    assert_eq!(body["data"]["tracking_number"], "TRK-100");
    assert!(!body["data"]["estimated_delivery_at"].is_null());

    let (status, body) = app
        .request_json(
            Method::POST,
            &format!("/api/v1/orders/{}/pickup", order.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "in-transit");
    assert!(body["data"]["commission"].is_null());

    let (status, body) = app
        .request_json(
            Method::POST,
            &format!("/api/v1/orders/{}/complete", order.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["commission"], "10.00");
    assert_eq!(body["data"]["merchant_payout"], "190.00");

    // Completing again returns the frozen values unchanged.
    let (status, again) = app
        .request_json(
            Method::POST,
            &format!("/api/v1/orders/{}/complete", order.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["data"]["commission"], "10.00");
    assert_eq!(again["data"]["updated_at"], body["data"]["updated_at"]);
}

#[tokio::test]
async fn shipping_without_tracking_number_is_rejected() {
    let app = TestApp::new().await;
    let order = seed_paid_order(&app, dec!(50.00)).await;

    let (status, body) = app
        .request_json(
            Method::POST,
            &format!("/api/v1/orders/{}/ship", order.id),
            Some(json!({"tracking_number": ""})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn cancel_allowed_within_window_and_blocked_after_shipping() {
    let app = TestApp::new().await;

    let cancellable = seed_paid_order(&app, dec!(30.00)).await;
    let (status, body) = app
        .request_json(
            Method::POST,
            &format!("/api/v1/orders/{}/cancel", cancellable.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");

    let shipped = seed_paid_order(&app, dec!(40.00)).await;
    app.request_json(
        Method::POST,
        &format!("/api/v1/orders/{}/ship", shipped.id),
        Some(json!({"tracking_number": "TRK-1"})),
    )
    .await;
    let (status, body) = app
        .request_json(
            Method::POST,
            &format!("/api/v1/orders/{}/cancel", shipped.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["retryable"], false);
    assert!(body["message"].as_str().unwrap().contains("fulfillment"));
}

#[tokio::test]
async fn dispute_and_refund_are_reachable_from_non_terminal_states() {
    let app = TestApp::new().await;

    let disputed = seed_paid_order(&app, dec!(10.00)).await;
    let (status, body) = app
        .request_json(
            Method::POST,
            &format!("/api/v1/orders/{}/dispute", disputed.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "disputed");

    let refunded = seed_paid_order(&app, dec!(20.00)).await;
    app.request_json(
        Method::POST,
        &format!("/api/v1/orders/{}/ship", refunded.id),
        Some(json!({"tracking_number": "TRK-2"})),
    )
    .await;
    let (status, body) = app
        .request_json(
            Method::POST,
            &format!("/api/v1/orders/{}/refund", refunded.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "refunded");

    // A terminal order cannot branch again.
    let (status, _) = app
        .request_json(
            Method::POST,
            &format!("/api/v1/orders/{}/refund", disputed.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn listing_and_lookup() {
    let app = TestApp::new().await;
    let order = seed_paid_order(&app, dec!(15.00)).await;
    seed_paid_order(&app, dec!(25.00)).await;

    let (status, body) = app
        .request_json(Method::GET, "/api/v1/orders?page=1&per_page=1", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["orders"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .request_json(Method::GET, &format!("/api/v1/orders/{}", order.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], "15.00");

    let (status, _) = app
        .request_json(
            Method::GET,
            &format!("/api/v1/orders/{}", Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
