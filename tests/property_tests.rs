//! Property-based tests for the monetary arithmetic.

use orderflow_api::money::{commission_split, discounted_total, round2};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    // Amounts up to 100,000.00, expressed in cents to stay exact.
    (0i64..=10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn percent_strategy() -> impl Strategy<Value = Decimal> {
    // Whole and tenth-of-a-percent discounts across the valid range.
    (0i64..=1000).prop_map(|tenths| Decimal::new(tenths, 1))
}

proptest! {
    #[test]
    fn payable_is_within_bounds_and_cent_precise(
        amount in amount_strategy(),
        percent in percent_strategy(),
    ) {
        let payable = discounted_total(amount, percent);
        prop_assert!(payable >= Decimal::ZERO);
        prop_assert!(payable <= amount);
        // Already rounded to cents: re-rounding changes nothing.
        prop_assert_eq!(payable, round2(payable));
    }

    #[test]
    fn extreme_discounts_behave(amount in amount_strategy()) {
        prop_assert_eq!(discounted_total(amount, dec!(100)), Decimal::ZERO);
        prop_assert_eq!(discounted_total(amount, Decimal::ZERO), amount);
    }

    #[test]
    fn out_of_range_percent_is_clamped(
        amount in amount_strategy(),
        percent in -500i64..=500,
    ) {
        let payable = discounted_total(amount, Decimal::from(percent));
        prop_assert!(payable >= Decimal::ZERO);
        prop_assert!(payable <= amount);
    }

    #[test]
    fn deeper_discounts_never_cost_more(
        amount in amount_strategy(),
        a in 0i64..=100,
        b in 0i64..=100,
    ) {
        let (low, high) = (a.min(b), a.max(b));
        let shallow = discounted_total(amount, Decimal::from(low));
        let deep = discounted_total(amount, Decimal::from(high));
        prop_assert!(deep <= shallow);
    }

    #[test]
    fn commission_split_conserves_the_total(
        total in amount_strategy(),
        rate_bps in 0u32..=10_000,
    ) {
        let rate = Decimal::new(rate_bps as i64, 4);
        let split = commission_split(total, rate);
        prop_assert_eq!(split.commission + split.merchant_payout, total);
        prop_assert!(split.commission >= Decimal::ZERO);
        prop_assert!(split.commission <= total);
        prop_assert_eq!(split.commission, round2(total * rate));
    }
}
