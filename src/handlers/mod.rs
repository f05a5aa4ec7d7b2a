pub mod checkout;
pub mod orders;

use axum::{
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use crate::AppState;

/// Liveness of this service itself, distinct from the gateway pre-flight.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "orderflow-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Assembles the full application router.
pub fn app_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/checkout", post(checkout::begin_checkout))
        .route("/checkout/return", get(checkout::complete_checkout))
        .route("/promo-codes/apply", post(checkout::apply_promo))
        .route("/promo-codes/active/:payer_id", get(checkout::active_discount))
        .route("/orders", get(orders::list_orders))
        .route("/orders/:id", get(orders::get_order))
        .route("/orders/:id/ship", post(orders::ship_order))
        .route("/orders/:id/pickup", post(orders::carrier_pickup))
        .route("/orders/:id/complete", post(orders::complete_order))
        .route("/orders/:id/cancel", post(orders::cancel_order))
        .route("/orders/:id/dispute", post(orders::dispute_order))
        .route("/orders/:id/refund", post(orders::refund_order));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .with_state(state)
}
