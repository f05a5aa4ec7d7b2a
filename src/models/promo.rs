use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money;

/// A promo code applied to a checkout session.
///
/// The discount percent is clamped to [0, 100] at construction; a 100%
/// discount makes the payable amount zero and skips the gateway entirely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromoApplication {
    pub code: String,
    pub discount_percent: Decimal,
    pub expires_at: Option<DateTime<Utc>>,
}

impl PromoApplication {
    pub fn new(code: String, discount_percent: Decimal, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            code,
            discount_percent: money::clamp_percent(discount_percent),
            expires_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn clamps_discount_on_construction() {
        let promo = PromoApplication::new("BIG".to_string(), dec!(250), None);
        assert_eq!(promo.discount_percent, dec!(100));
        let promo = PromoApplication::new("NEG".to_string(), dec!(-5), None);
        assert_eq!(promo.discount_percent, Decimal::ZERO);
    }

    #[test]
    fn expiry_check() {
        let now = Utc::now();
        let live = PromoApplication::new("A".into(), dec!(10), Some(now + chrono::Duration::hours(1)));
        let dead = PromoApplication::new("B".into(), dec!(10), Some(now - chrono::Duration::hours(1)));
        let forever = PromoApplication::new("C".into(), dec!(10), None);
        assert!(!live.is_expired(now));
        assert!(dead.is_expired(now));
        assert!(!forever.is_expired(now));
    }
}
