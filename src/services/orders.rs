use chrono::{Duration, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
    models::order::{Order, OrderItem, OrderStatus},
    money,
};

/// Days from shipment to the advertised delivery estimate.
const ESTIMATED_DELIVERY_DAYS: i64 = 5;

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub orders: Vec<Order>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// The order state machine.
///
/// Sole mutator of order records. Every transition is safe to invoke
/// redundantly: an order already in the target state is returned unchanged
/// rather than treated as an error, which makes UI re-dispatch and event
/// replay harmless without locking.
#[derive(Clone)]
pub struct OrderService {
    store: DashMap<Uuid, Order>,
    event_sender: Option<EventSender>,
    commission_rate: Decimal,
    cancellation_window: Duration,
}

impl OrderService {
    pub fn new(
        commission_rate: Decimal,
        cancellation_window: Duration,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            store: DashMap::new(),
            event_sender,
            commission_rate,
            cancellation_window,
        }
    }

    /// Creates an order in `pending-payment` and hands it back to the caller.
    #[instrument(skip(self, items), fields(total = %total))]
    pub async fn create_order(
        &self,
        items: Vec<OrderItem>,
        total: Decimal,
    ) -> Result<Order, ServiceError> {
        if items.is_empty() {
            return Err(ServiceError::ValidationError(
                "Order must contain at least one item".to_string(),
            ));
        }
        if total < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Order total cannot be negative".to_string(),
            ));
        }

        let order = Order::new(items, total);
        self.store.insert(order.id, order.clone());
        info!(order_id = %order.id, "order created");
        self.emit(Event::OrderCreated(order.id)).await;
        Ok(order)
    }

    /// `pending-payment → paid-awaiting-fulfillment`, after capture success.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn mark_paid(&self, order_id: Uuid) -> Result<Order, ServiceError> {
        let order = self.transition(
            order_id,
            OrderStatus::PaidAwaitingFulfillment,
            &[OrderStatus::PendingPayment],
            |_| Ok(()),
        )?;
        self.emit(Event::OrderPaid(order_id)).await;
        Ok(order)
    }

    /// `paid-awaiting-fulfillment → shipped`.
    ///
    /// Records the tracking number and delivery estimate; the emitted
    /// `OrderShipped` event drives the deferred in-transit follow-up.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn mark_shipped(
        &self,
        order_id: Uuid,
        tracking_number: &str,
    ) -> Result<Order, ServiceError> {
        let tracking_number = tracking_number.trim();
        if tracking_number.is_empty() {
            return Err(ServiceError::ValidationError(
                "Tracking number is required".to_string(),
            ));
        }

        let order = self.transition(
            order_id,
            OrderStatus::Shipped,
            &[OrderStatus::PaidAwaitingFulfillment],
            |order| {
                order.tracking_number = Some(tracking_number.to_string());
                order.estimated_delivery_at =
                    Some(Utc::now() + Duration::days(ESTIMATED_DELIVERY_DAYS));
                Ok(())
            },
        )?;
        self.emit(Event::OrderShipped {
            order_id,
            tracking_number: tracking_number.to_string(),
        })
        .await;
        Ok(order)
    }

    /// `shipped → in-transit`. Triggered by the carrier-pickup hook, not by
    /// a user action.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn mark_in_transit(&self, order_id: Uuid) -> Result<Order, ServiceError> {
        let order = self.transition(
            order_id,
            OrderStatus::InTransit,
            &[OrderStatus::Shipped],
            |_| Ok(()),
        )?;
        self.emit(Event::OrderInTransit(order_id)).await;
        Ok(order)
    }

    /// `in-transit → completed`. Computes and freezes the commission split.
    ///
    /// Idempotent: a repeated call on a completed order returns the frozen
    /// values without recomputation.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn mark_completed(&self, order_id: Uuid) -> Result<Order, ServiceError> {
        let rate = self.commission_rate;
        let order = self.transition(
            order_id,
            OrderStatus::Completed,
            &[OrderStatus::InTransit],
            |order| {
                let split = money::commission_split(order.total, rate);
                order.commission = Some(split.commission);
                order.merchant_payout = Some(split.merchant_payout);
                Ok(())
            },
        )?;
        // A completed order always carries both payout fields.
        self.emit(Event::OrderCompleted {
            order_id,
            commission: order.commission.unwrap_or_default(),
            merchant_payout: order.merchant_payout.unwrap_or_default(),
        })
        .await;
        Ok(order)
    }

    /// Buyer cancellation, allowed only while the order awaits fulfillment
    /// and the cancellation window is still open.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel(&self, order_id: Uuid) -> Result<Order, ServiceError> {
        let window = self.cancellation_window;
        let order = {
            let mut entry = self
                .store
                .get_mut(&order_id)
                .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

            if entry.status == OrderStatus::Cancelled {
                return Ok(entry.clone());
            }
            if entry.status != OrderStatus::PaidAwaitingFulfillment {
                return Err(ServiceError::PolicyViolation(format!(
                    "Cancellation is only allowed while awaiting fulfillment (order is {})",
                    entry.status
                )));
            }
            if Utc::now() >= entry.created_at + window {
                return Err(ServiceError::PolicyViolation(format!(
                    "Cancellation window of {} hours has expired",
                    window.num_hours()
                )));
            }

            entry.set_status(OrderStatus::Cancelled);
            entry.clone()
        };
        info!(order_id = %order_id, "order cancelled");
        self.emit(Event::OrderCancelled(order_id)).await;
        Ok(order)
    }

    /// Externally-triggered dispute, reachable from any non-terminal state.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn dispute(&self, order_id: Uuid) -> Result<Order, ServiceError> {
        let order = self.branch_to(order_id, OrderStatus::Disputed)?;
        self.emit(Event::OrderDisputed(order_id)).await;
        Ok(order)
    }

    /// Externally-triggered refund, reachable from any non-terminal state.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn refund(&self, order_id: Uuid) -> Result<Order, ServiceError> {
        let order = self.branch_to(order_id, OrderStatus::Refunded)?;
        self.emit(Event::OrderRefunded(order_id)).await;
        Ok(order)
    }

    pub fn get_order(&self, order_id: Uuid) -> Result<Order, ServiceError> {
        self.store
            .get(&order_id)
            .map(|entry| entry.clone())
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }

    /// Lists orders newest-first with simple pagination (1-based page).
    pub fn list_orders(&self, page: u64, per_page: u64) -> OrderListResponse {
        let mut orders: Vec<Order> = self.store.iter().map(|entry| entry.clone()).collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = orders.len() as u64;
        let per_page = per_page.max(1);
        let start = (page.max(1) - 1).saturating_mul(per_page) as usize;
        let orders = orders
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();

        OrderListResponse {
            orders,
            total,
            page: page.max(1),
            per_page,
        }
    }

    /// Core transition rule: no-op when already in `target`, mutate when in
    /// one of `allowed_from`, `PolicyViolation` otherwise.
    fn transition(
        &self,
        order_id: Uuid,
        target: OrderStatus,
        allowed_from: &[OrderStatus],
        mutate: impl FnOnce(&mut Order) -> Result<(), ServiceError>,
    ) -> Result<Order, ServiceError> {
        let mut entry = self
            .store
            .get_mut(&order_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if entry.status == target {
            return Ok(entry.clone());
        }
        if !allowed_from.contains(&entry.status) {
            return Err(ServiceError::PolicyViolation(format!(
                "Cannot move order from {} to {}",
                entry.status, target
            )));
        }

        mutate(&mut entry)?;
        entry.set_status(target);
        info!(order_id = %order_id, status = %target, "order transitioned");
        Ok(entry.clone())
    }

    fn branch_to(&self, order_id: Uuid, target: OrderStatus) -> Result<Order, ServiceError> {
        let mut entry = self
            .store
            .get_mut(&order_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if entry.status == target {
            return Ok(entry.clone());
        }
        if entry.status.is_terminal() {
            return Err(ServiceError::PolicyViolation(format!(
                "Cannot move order from terminal state {} to {}",
                entry.status, target
            )));
        }

        entry.set_status(target);
        info!(order_id = %order_id, status = %target, "order branched");
        Ok(entry.clone())
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "failed to send domain event");
            }
        }
    }
}
