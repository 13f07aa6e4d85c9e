//! Unit tests for the Money module
//!
//! Tests cover creation, rounding, positivity checks, parsing and
//! arithmetic at the ledger's two-place precision.

use core_kernel::{Money, MoneyError, round_currency};
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_creates_money_with_correct_amount() {
        let m = Money::new(dec!(100.50));
        assert_eq!(m.amount(), dec!(100.50));
    }

    #[test]
    fn test_new_rounds_half_away_from_zero() {
        assert_eq!(Money::new(dec!(2.345)).amount(), dec!(2.35));
        assert_eq!(Money::new(dec!(2.344)).amount(), dec!(2.34));
        assert_eq!(Money::new(dec!(-2.345)).amount(), dec!(-2.35));
    }

    #[test]
    fn test_from_minor_converts_cents_correctly() {
        let m = Money::from_minor(10050);
        assert_eq!(m.amount(), dec!(100.50));
    }

    #[test]
    fn test_zero_creates_zero_amount() {
        assert!(Money::zero().is_zero());
        assert_eq!(Money::default(), Money::zero());
    }

    #[test]
    fn test_parse_accepts_decimal_strings() {
        assert_eq!(Money::parse(" 15.5 ").unwrap().amount(), dec!(15.50));
        assert!(matches!(Money::parse("fifteen"), Err(MoneyError::InvalidAmount(_))));
    }
}

mod predicates {
    use super::*;

    #[test]
    fn test_is_positive_true_for_positive_amount() {
        assert!(Money::new(dec!(0.01)).is_positive());
    }

    #[test]
    fn test_is_positive_false_for_zero_and_negative() {
        assert!(!Money::zero().is_positive());
        assert!(!Money::new(dec!(-3)).is_positive());
    }

    #[test]
    fn test_positive_constructor() {
        assert_eq!(Money::positive(dec!(19.999)).unwrap().amount(), dec!(20.00));
        assert_eq!(Money::positive(dec!(0)), Err(MoneyError::NotPositive(dec!(0))));
        assert!(Money::positive(dec!(-0.50)).is_err());
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_checked_add() {
        let a = Money::new(dec!(20.00));
        let b = Money::new(dec!(15.00));
        assert_eq!(a.checked_add(&b).unwrap().amount(), dec!(35.00));
    }

    #[test]
    fn test_checked_times_rounds_line_total() {
        let unit = Money::new(dec!(2.00));
        assert_eq!(unit.checked_times(10).unwrap().amount(), dec!(20.00));
    }

    #[test]
    fn test_sum_of_cent_fractions_does_not_drift() {
        let total: Money = std::iter::repeat(Money::new(dec!(0.10))).take(30).sum();
        assert_eq!(total.amount(), dec!(3.00));
    }

    #[test]
    fn test_round_currency_helper() {
        assert_eq!(round_currency(dec!(35.004)), dec!(35.00));
    }
}
