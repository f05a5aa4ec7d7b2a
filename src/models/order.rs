use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical order statuses.
///
/// The happy path runs `PendingPayment → PaidAwaitingFulfillment → Shipped
/// → InTransit → Completed`; `Cancelled`, `Disputed` and `Refunded` are
/// side branches reachable from non-terminal states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OrderStatus {
    PendingPayment,
    PaidAwaitingFulfillment,
    Shipped,
    InTransit,
    Completed,
    Cancelled,
    Disputed,
    Refunded,
}

impl OrderStatus {
    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Completed
                | OrderStatus::Cancelled
                | OrderStatus::Disputed
                | OrderStatus::Refunded
        )
    }
}

/// A purchased line item. Immutable after order creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A marketplace order.
///
/// `total` is fixed at creation (the post-discount payable amount).
/// `commission` and `merchant_payout` are populated exactly once, when the
/// order completes, and are absent in every other status.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tracking_number: Option<String>,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub commission: Option<Decimal>,
    pub merchant_payout: Option<Decimal>,
}

impl Order {
    /// Creates a new order in `pending-payment` with the given payable total.
    pub fn new(items: Vec<OrderItem>, total: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            items,
            total,
            status: OrderStatus::PendingPayment,
            created_at: now,
            updated_at: now,
            tracking_number: None,
            estimated_delivery_at: None,
            commission: None,
            merchant_payout: None,
        }
    }

    /// Sum of line totals before any discount.
    pub fn items_total(&self) -> Decimal {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    pub(crate) fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}
