//! Monetary arithmetic for discounting and payout splitting.
//!
//! All amounts are `rust_decimal::Decimal`; rounding is always to two
//! decimal places with round-half-up semantics. Binary floating point is
//! never used for money.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Rounds to 2 decimal places, half away from zero.
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamps a discount percentage into [0, 100].
pub fn clamp_percent(percent: Decimal) -> Decimal {
    percent.clamp(Decimal::ZERO, dec!(100))
}

/// Payable amount after a percentage discount, rounded to cents.
///
/// The percent is clamped before use; a 100% discount yields exactly zero.
pub fn discounted_total(amount: Decimal, discount_percent: Decimal) -> Decimal {
    let percent = clamp_percent(discount_percent);
    round2(amount * (Decimal::ONE - percent / dec!(100)))
}

/// Split of an order total into platform commission and merchant payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSplit {
    pub commission: Decimal,
    pub merchant_payout: Decimal,
}

/// Computes the commission split for a completed order.
///
/// The payout is the remainder after the rounded commission, so the two
/// parts always sum exactly to the total.
pub fn commission_split(total: Decimal, rate: Decimal) -> CommissionSplit {
    let commission = round2(total * rate);
    CommissionSplit {
        commission,
        merchant_payout: total - commission,
    }
}
