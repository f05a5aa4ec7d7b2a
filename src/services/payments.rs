use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
    gateway::{CreateGatewayOrderRequest, PaymentGateway},
    models::payment::{AttemptStatus, CheckoutIntent, PaymentAttempt, ReturnParams},
    models::Order,
    money,
    services::orders::OrderService,
};

/// Result of phase 1 of the capture protocol.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CheckoutOutcome {
    /// Zero payable amount: the purchase completed without the gateway.
    Completed { order: Order },
    /// The payer must approve at the gateway before capture.
    Redirect {
        approve_link: String,
        gateway_order_id: String,
    },
}

/// Result of a successful capture, with the raw gateway payload for audit.
/// Replayed captures carry no payload; the order is returned unchanged.
#[derive(Debug, Serialize)]
pub struct CaptureReceipt {
    pub order: Order,
    pub gateway_payload: Option<serde_json::Value>,
}

struct StoredAttempt {
    intent: CheckoutIntent,
    attempt: PaymentAttempt,
}

/// The two-phase payment capture protocol.
///
/// Phase 1 creates a gateway order and records the correlation token
/// *before* the payer is redirected away; phase 2 matches the return
/// navigation against that token and captures. Both phases survive the
/// process being torn down in between: the attempt table is keyed on the
/// gateway order id, and processed captures are remembered so a reloaded
/// return page cannot apply a capture twice.
pub struct PaymentService {
    gateway: Arc<dyn PaymentGateway>,
    orders: Arc<OrderService>,
    event_sender: Option<EventSender>,
    attempts: DashMap<String, StoredAttempt>,
    processed: DashMap<String, Uuid>,
    health_attempts: u32,
    health_delay: Duration,
}

impl PaymentService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        orders: Arc<OrderService>,
        event_sender: Option<EventSender>,
        health_attempts: u32,
        health_delay: Duration,
    ) -> Self {
        Self {
            gateway,
            orders,
            event_sender,
            attempts: DashMap::new(),
            processed: DashMap::new(),
            health_attempts: health_attempts.max(1),
            health_delay,
        }
    }

    /// Phase 1: compute the payable amount, pre-flight the gateway, create
    /// the remote order, and durably record the correlation token before
    /// returning the redirect target.
    #[instrument(skip(self, intent), fields(payer_id = %intent.payer_id))]
    pub async fn begin_checkout(
        &self,
        intent: CheckoutIntent,
    ) -> Result<CheckoutOutcome, ServiceError> {
        intent.validate()?;

        let payable = money::discounted_total(intent.amount(), intent.discount_percent);
        if payable <= Decimal::ZERO {
            // Fully discounted: a zero-value completed purchase, no gateway.
            info!("payable amount is zero, skipping gateway");
            let order = self
                .orders
                .create_order(intent.items.clone(), payable.max(Decimal::ZERO))
                .await?;
            let order = self.orders.mark_paid(order.id).await?;
            return Ok(CheckoutOutcome::Completed { order });
        }

        self.ensure_gateway_ready().await?;

        let mut attempt = PaymentAttempt::new(payable);
        attempt.status = AttemptStatus::Processing;

        let response = self
            .gateway
            .create_order(CreateGatewayOrderRequest {
                amount: payable,
                description: intent.description.clone(),
            })
            .await
            .map_err(|e| ServiceError::OrderCreationFailed(e.to_string()))?;

        if !response.ok {
            return Err(ServiceError::OrderCreationFailed(
                response
                    .error
                    .unwrap_or_else(|| "gateway rejected the order".to_string()),
            ));
        }
        let (approve_link, gateway_order_id) = match (response.approve_link, response.gateway_order_id)
        {
            (Some(link), Some(token)) => (link, token),
            _ => {
                return Err(ServiceError::OrderCreationFailed(
                    "gateway response missing approve link or order id".to_string(),
                ))
            }
        };

        // The token must be recorded before control leaves for the redirect;
        // phase 2 recovers the attempt from it alone.
        attempt.status = AttemptStatus::Approving;
        attempt.gateway_order_id = Some(gateway_order_id.clone());
        self.attempts.insert(
            gateway_order_id.clone(),
            StoredAttempt { intent, attempt },
        );

        info!(%gateway_order_id, "gateway order created, redirecting payer");
        Ok(CheckoutOutcome::Redirect {
            approve_link,
            gateway_order_id,
        })
    }

    /// Phase 2: inspect the return navigation and capture.
    ///
    /// Fails closed without a recoverable correlation token. A token whose
    /// capture was already processed returns the existing order instead of
    /// capturing again. A failed capture marks the attempt as errored; the
    /// stale token cannot be retried and a fresh phase 1 is required.
    #[instrument(skip(self, params))]
    pub async fn complete_checkout(
        &self,
        params: ReturnParams,
    ) -> Result<CaptureReceipt, ServiceError> {
        if params.cancelled {
            return Err(ServiceError::PaymentCancelled);
        }
        let token = params
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                ServiceError::ValidationError("Missing correlation token".to_string())
            })?;

        if let Some(order_id) = self.processed.get(&token).map(|entry| *entry) {
            info!(%token, %order_id, "capture already processed, replaying result");
            let order = self.orders.get_order(order_id)?;
            return Ok(CaptureReceipt {
                order,
                gateway_payload: None,
            });
        }

        // Only an attempt still awaiting approval may be captured; an
        // unknown token and an already-errored one are indistinguishable to
        // the caller.
        let recoverable = self
            .attempts
            .get(&token)
            .is_some_and(|entry| entry.attempt.status == AttemptStatus::Approving);
        if !recoverable {
            return Err(ServiceError::ValidationError(
                "Missing correlation token".to_string(),
            ));
        }

        let capture = match self.gateway.capture_order(&token).await {
            Ok(capture) if capture.ok => capture,
            Ok(capture) => {
                let message = capture
                    .error
                    .unwrap_or_else(|| "gateway reported capture failure".to_string());
                self.fail_attempt(&token, &message);
                return Err(ServiceError::CaptureFailed(message));
            }
            Err(e) => {
                warn!(%token, error = %e, "capture request failed");
                let message = e.to_string();
                self.fail_attempt(&token, &message);
                return Err(ServiceError::CaptureFailed(message));
            }
        };

        let (items, amount) = {
            let mut entry = self.attempts.get_mut(&token).ok_or_else(|| {
                ServiceError::ValidationError("Missing correlation token".to_string())
            })?;
            entry.attempt.status = AttemptStatus::Completed;
            (entry.intent.items.clone(), entry.attempt.amount)
        };

        let order = self.orders.create_order(items, amount).await?;
        let order = self.orders.mark_paid(order.id).await?;
        self.processed.insert(token.clone(), order.id);

        self.emit(Event::PaymentCaptured {
            gateway_order_id: token,
            order_id: order.id,
        })
        .await;

        Ok(CaptureReceipt {
            order,
            gateway_payload: capture.data,
        })
    }

    /// Snapshot of the attempt recorded for a correlation token, if any,
    /// including completed and errored ones.
    pub fn attempt_for(&self, gateway_order_id: &str) -> Option<PaymentAttempt> {
        self.attempts
            .get(gateway_order_id)
            .map(|entry| entry.attempt.clone())
    }

    fn fail_attempt(&self, gateway_order_id: &str, error_kind: &str) {
        if let Some(mut entry) = self.attempts.get_mut(gateway_order_id) {
            entry.attempt.status = AttemptStatus::Error;
            entry.attempt.error_kind = Some(error_kind.to_string());
        }
    }

    /// Pre-flight health check with bounded retry: up to `health_attempts`
    /// tries with `health_delay` between them. Missing credentials abort
    /// immediately; retrying cannot fix configuration.
    async fn ensure_gateway_ready(&self) -> Result<(), ServiceError> {
        for attempt in 1..=self.health_attempts {
            match self.gateway.health().await {
                Ok(health) if health.has_credentials == Some(false) => {
                    return Err(ServiceError::GatewayMisconfigured);
                }
                Ok(health) if health.ok => return Ok(()),
                Ok(_) => warn!(attempt, "gateway reported unhealthy"),
                Err(e) => warn!(attempt, error = %e, "gateway health check failed"),
            }
            if attempt < self.health_attempts {
                tokio::time::sleep(self.health_delay).await;
            }
        }
        Err(ServiceError::GatewayUnreachable)
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "failed to send domain event");
            }
        }
    }
}
