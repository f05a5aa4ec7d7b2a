//! Checkout and promo endpoints. Controllers only: validation and
//! delegation, no business rules.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::ServiceError,
    models::order::OrderItem,
    models::payment::{CheckoutIntent, ReturnParams},
    models::promo::PromoApplication,
    services::payments::{CaptureReceipt, CheckoutOutcome},
    ApiResponse, AppState,
};

#[derive(Debug, Deserialize, Serialize)]
pub struct CheckoutItemRequest {
    pub product_id: String,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    pub payer_id: Uuid,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<CheckoutItemRequest>,
}

impl CheckoutRequest {
    fn into_items(self) -> Result<(Uuid, String, Vec<OrderItem>), ServiceError> {
        let mut items = Vec::with_capacity(self.items.len());
        for item in self.items {
            if item.unit_price <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "Item '{}' must have a positive unit price",
                    item.product_id
                )));
            }
            if item.quantity == 0 {
                return Err(ServiceError::ValidationError(format!(
                    "Item '{}' must have a positive quantity",
                    item.product_id
                )));
            }
            items.push(OrderItem {
                product_id: item.product_id,
                title: item.title,
                unit_price: item.unit_price,
                quantity: item.quantity,
            });
        }
        Ok((self.payer_id, self.description, items))
    }
}

/// `POST /api/v1/checkout`: phase 1 of the capture protocol.
pub async fn begin_checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<ApiResponse<CheckoutOutcome>>, ServiceError> {
    request.validate()?;
    let (payer_id, description, items) = request.into_items()?;

    // Best active discount for the payer; session first, then backend.
    let mut discount_percent = state.services.promos.active_discount(payer_id);
    if discount_percent == Decimal::ZERO {
        discount_percent = state.services.promos.fetch_active_discount(payer_id).await;
    }

    let outcome = state
        .services
        .payments
        .begin_checkout(CheckoutIntent {
            payer_id,
            description,
            items,
            discount_percent,
        })
        .await?;

    Ok(Json(ApiResponse::ok(outcome)))
}

/// `GET /api/v1/checkout/return`: phase 2, invoked by the gateway's return
/// navigation with a cancellation flag or a correlation token.
pub async fn complete_checkout(
    State(state): State<AppState>,
    Query(params): Query<ReturnParams>,
) -> Result<Json<ApiResponse<CaptureReceipt>>, ServiceError> {
    let receipt = state.services.payments.complete_checkout(params).await?;
    Ok(Json(ApiResponse::ok(receipt)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApplyPromoBody {
    #[validate(length(min = 1, message = "Promo code is required"))]
    pub code: String,
    pub payer_id: Uuid,
}

/// `POST /api/v1/promo-codes/apply`
pub async fn apply_promo(
    State(state): State<AppState>,
    Json(body): Json<ApplyPromoBody>,
) -> Result<(StatusCode, Json<ApiResponse<PromoApplication>>), ServiceError> {
    body.validate()?;
    let application = state
        .services
        .promos
        .apply_code(&body.code, body.payer_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(application))))
}

#[derive(Debug, Serialize)]
pub struct ActiveDiscountBody {
    pub discount_percent: Decimal,
}

/// `GET /api/v1/promo-codes/active/:payer_id`
pub async fn active_discount(
    State(state): State<AppState>,
    Path(payer_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ActiveDiscountBody>>, ServiceError> {
    let discount_percent = state.services.promos.fetch_active_discount(payer_id).await;
    Ok(Json(ApiResponse::ok(ActiveDiscountBody { discount_percent })))
}
