use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::order::OrderItem;

/// Status of a payment attempt: `Idle → Processing → Approving`, ending in
/// `Completed` or `Error` once the capture resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AttemptStatus {
    Idle,
    Processing,
    Approving,
    Completed,
    Error,
}

/// Ephemeral per-checkout payment state.
///
/// The `gateway_order_id` is the correlation token: it is recorded before
/// the payer is redirected away, so the capture callback can be matched
/// even after the process was torn down and resumed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentAttempt {
    pub amount: Decimal,
    pub status: AttemptStatus,
    pub gateway_order_id: Option<String>,
    pub error_kind: Option<String>,
}

impl PaymentAttempt {
    pub fn new(amount: Decimal) -> Self {
        Self {
            amount,
            status: AttemptStatus::Idle,
            gateway_order_id: None,
            error_kind: None,
        }
    }
}

/// Input to phase 1 of the capture protocol.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct CheckoutIntent {
    pub payer_id: Uuid,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<OrderItem>,
    /// Percentage discount to apply, clamped to [0, 100] before use
    pub discount_percent: Decimal,
}

impl CheckoutIntent {
    /// Pre-discount amount: the sum of line totals.
    pub fn amount(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| item.unit_price * Decimal::from(item.quantity))
            .sum()
    }
}

/// Query parameters carried by the gateway's return navigation.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReturnParams {
    /// Cancellation flag set when the payer aborted at the gateway
    #[serde(default)]
    pub cancelled: bool,
    /// Correlation token matching a previously stored gateway order id
    pub token: Option<String>,
}
