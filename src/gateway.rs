//! Boundary contract with the external payment gateway backend.
//!
//! The engine only ever sees these wire shapes; everything past this module
//! is a classified [`ServiceError`]. The [`PaymentGateway`] and
//! [`PromoBackend`] traits are the seams tests substitute.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use crate::errors::ServiceError;

/// `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
    /// Absent on older backends; `Some(false)` means missing credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_credentials: Option<bool>,
}

/// `POST /order` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGatewayOrderRequest {
    pub amount: Decimal,
    pub description: String,
}

/// `POST /order` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGatewayOrderResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approve_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `POST /order/{token}/capture` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `GET /promo-codes/active/{userId}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveDiscountResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_percent: Option<Decimal>,
}

/// `POST /promo-codes/apply` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyPromoRequest {
    pub code: String,
    pub user_id: Uuid,
}

/// `POST /promo-codes/apply` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyPromoResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Payment side of the gateway backend.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn health(&self) -> Result<HealthResponse, ServiceError>;
    async fn create_order(
        &self,
        request: CreateGatewayOrderRequest,
    ) -> Result<CreateGatewayOrderResponse, ServiceError>;
    async fn capture_order(&self, token: &str) -> Result<CaptureResponse, ServiceError>;
}

/// Promo-code side of the gateway backend.
#[async_trait]
pub trait PromoBackend: Send + Sync {
    async fn active_discount(&self, payer_id: Uuid) -> Result<ActiveDiscountResponse, ServiceError>;
    async fn apply_code(&self, request: ApplyPromoRequest) -> Result<ApplyPromoResponse, ServiceError>;
}

/// HTTP client for the gateway backend, implementing both boundary traits.
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ServiceError::InternalError(format!("Invalid gateway base URL: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::InternalError(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path)
            .map_err(|e| ServiceError::InternalError(format!("Invalid gateway path {path}: {e}")))
    }
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    #[instrument(skip(self))]
    async fn health(&self) -> Result<HealthResponse, ServiceError> {
        let url = self.endpoint("health")?;
        let response = self.client.get(url).send().await?;
        Ok(response.json().await?)
    }

    #[instrument(skip(self), fields(amount = %request.amount))]
    async fn create_order(
        &self,
        request: CreateGatewayOrderRequest,
    ) -> Result<CreateGatewayOrderResponse, ServiceError> {
        let url = self.endpoint("order")?;
        let response = self.client.post(url).json(&request).send().await?;
        Ok(response.json().await?)
    }

    #[instrument(skip(self))]
    async fn capture_order(&self, token: &str) -> Result<CaptureResponse, ServiceError> {
        let url = self.endpoint(&format!("order/{token}/capture"))?;
        let response = self.client.post(url).send().await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl PromoBackend for HttpGateway {
    #[instrument(skip(self))]
    async fn active_discount(&self, payer_id: Uuid) -> Result<ActiveDiscountResponse, ServiceError> {
        let url = self.endpoint(&format!("promo-codes/active/{payer_id}"))?;
        let response = self.client.get(url).send().await?;
        Ok(response.json().await?)
    }

    #[instrument(skip(self), fields(code = %request.code))]
    async fn apply_code(&self, request: ApplyPromoRequest) -> Result<ApplyPromoResponse, ServiceError> {
        let url = self.endpoint("promo-codes/apply")?;
        let response = self.client.post(url).json(&request).send().await?;
        Ok(response.json().await?)
    }
}
