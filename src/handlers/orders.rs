//! Order-management endpoints: list, inspect, and drive fulfillment
//! transitions. All rules live in [`crate::services::orders::OrderService`].

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::ServiceError,
    models::Order,
    services::orders::OrderListResponse,
    ApiResponse, AppState, ListQuery,
};

/// `GET /api/v1/orders`
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<ApiResponse<OrderListResponse>> {
    let page = state.services.orders.list_orders(query.page, query.per_page);
    Json(ApiResponse::ok(page))
}

/// `GET /api/v1/orders/:id`
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Order>>, ServiceError> {
    let order = state.services.orders.get_order(id)?;
    Ok(Json(ApiResponse::ok(order)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ShipOrderBody {
    #[validate(length(min = 1, message = "Tracking number is required"))]
    pub tracking_number: String,
}

/// `POST /api/v1/orders/:id/ship`
pub async fn ship_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ShipOrderBody>,
) -> Result<Json<ApiResponse<Order>>, ServiceError> {
    body.validate()?;
    let order = state
        .services
        .orders
        .mark_shipped(id, &body.tracking_number)
        .await?;
    Ok(Json(ApiResponse::ok(order)))
}

/// `POST /api/v1/orders/:id/pickup`: the carrier-event hook moving a
/// shipped order to in-transit.
pub async fn carrier_pickup(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Order>>, ServiceError> {
    let order = state.services.orders.mark_in_transit(id).await?;
    Ok(Json(ApiResponse::ok(order)))
}

/// `POST /api/v1/orders/:id/complete`
pub async fn complete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Order>>, ServiceError> {
    let order = state.services.orders.mark_completed(id).await?;
    Ok(Json(ApiResponse::ok(order)))
}

/// `POST /api/v1/orders/:id/cancel`
pub async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Order>>, ServiceError> {
    let order = state.services.orders.cancel(id).await?;
    Ok(Json(ApiResponse::ok(order)))
}

/// `POST /api/v1/orders/:id/dispute`
pub async fn dispute_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Order>>, ServiceError> {
    let order = state.services.orders.dispute(id).await?;
    Ok(Json(ApiResponse::ok(order)))
}

/// `POST /api/v1/orders/:id/refund`
pub async fn refund_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Order>>, ServiceError> {
    let order = state.services.orders.refund(id).await?;
    Ok(Json(ApiResponse::ok(order)))
}
