use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error body returned to clients.
///
/// `retryable` drives the UI: retryable errors render a retry action,
/// non-retryable ones a static explanation and a support path.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status category (e.g. "Bad Request", "Bad Gateway")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Whether the caller may retry the action immediately
    pub retryable: bool,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

/// Closed error taxonomy for the order/payment engine.
///
/// Every gateway-facing failure is classified into one of these variants at
/// the protocol boundary; raw transport errors never cross it.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Gateway health check failed after the bounded retry.
    #[error("Payment gateway is unreachable, please try again")]
    GatewayUnreachable,

    /// Gateway reports missing credentials; retrying cannot help.
    #[error("Payment gateway is not configured, please contact support")]
    GatewayMisconfigured,

    /// Gateway rejected the order-creation request.
    #[error("Order creation failed: {0}")]
    OrderCreationFailed(String),

    /// Payer aborted at the gateway; nothing was charged or recorded.
    #[error("Payment was cancelled before approval")]
    PaymentCancelled,

    /// Capture call failed or returned a non-ok result.
    #[error("Payment capture failed: {0}")]
    CaptureFailed(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A business rule blocked the action; the message names the rule.
    #[error("Policy violation: {0}")]
    PolicyViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::GatewayUnreachable => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::GatewayMisconfigured => StatusCode::BAD_GATEWAY,
            ServiceError::OrderCreationFailed(_) => StatusCode::BAD_GATEWAY,
            ServiceError::PaymentCancelled => StatusCode::PAYMENT_REQUIRED,
            ServiceError::CaptureFailed(_) => StatusCode::PAYMENT_REQUIRED,
            ServiceError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ServiceError::PolicyViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            ServiceError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the user may immediately retry the failed action.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::GatewayUnreachable
                | ServiceError::OrderCreationFailed(_)
                | ServiceError::PaymentCancelled
                | ServiceError::CaptureFailed(_)
                | ServiceError::ExternalServiceError(_)
        )
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::ExternalServiceError(err.to_string())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.to_string(),
            retryable: self.retryable(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        (status, Json(body)).into_response()
    }
}
