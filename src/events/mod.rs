use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::services::orders::OrderService;

/// Domain events emitted by the lifecycle engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated(Uuid),
    OrderPaid(Uuid),
    OrderShipped {
        order_id: Uuid,
        tracking_number: String,
    },
    OrderInTransit(Uuid),
    OrderCompleted {
        order_id: Uuid,
        commission: Decimal,
        merchant_payout: Decimal,
    },
    OrderCancelled(Uuid),
    OrderDisputed(Uuid),
    OrderRefunded(Uuid),
    PaymentCaptured {
        gateway_order_id: String,
        order_id: Uuid,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Consumes domain events until the channel closes.
///
/// `OrderShipped` schedules the carrier-pickup follow-up: after
/// `pickup_delay` the order moves to in-transit. A zero delay disables the
/// timer, leaving the pickup endpoint as the only trigger for the real
/// carrier event.
pub async fn process_events(
    mut receiver: mpsc::Receiver<Event>,
    orders: Arc<OrderService>,
    pickup_delay: Duration,
) {
    while let Some(event) = receiver.recv().await {
        match event {
            Event::OrderShipped { order_id, ref tracking_number } => {
                info!(%order_id, %tracking_number, "order shipped");
                if !pickup_delay.is_zero() {
                    let orders = orders.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(pickup_delay).await;
                        if let Err(e) = orders.mark_in_transit(order_id).await {
                            warn!(%order_id, error = %e, "deferred in-transit transition failed");
                        }
                    });
                }
            }
            Event::OrderCompleted {
                order_id,
                commission,
                merchant_payout,
            } => {
                info!(%order_id, %commission, %merchant_payout, "order completed, payout frozen");
            }
            Event::PaymentCaptured {
                ref gateway_order_id,
                order_id,
            } => {
                info!(%order_id, %gateway_order_id, "payment captured");
            }
            other => {
                info!(event = ?other, "domain event");
            }
        }
    }
    info!("event channel closed, processor exiting");
}
