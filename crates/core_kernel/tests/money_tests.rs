//! Unit tests for the Money and Percentage value objects
//!
//! Tests cover construction, rounding, arithmetic, serialization,
//! and the non-negativity invariant.

use core_kernel::{Money, MoneyError, Percentage};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_creates_money_with_correct_amount() {
        let m = Money::new(dec!(100.50)).unwrap();
        assert_eq!(m.amount(), dec!(100.50));
    }

    #[test]
    fn test_new_rounds_to_two_decimal_places_half_up() {
        assert_eq!(Money::new(dec!(100.125)).unwrap().amount(), dec!(100.13));
        assert_eq!(Money::new(dec!(100.135)).unwrap().amount(), dec!(100.14));
        assert_eq!(Money::new(dec!(100.1249)).unwrap().amount(), dec!(100.12));
    }

    #[test]
    fn test_new_fixes_scale() {
        let m = Money::new(dec!(7)).unwrap();
        assert_eq!(m.amount().scale(), 2);
        assert_eq!(m.amount().to_string(), "7.00");
    }

    #[test]
    fn test_from_cents_converts_correctly() {
        assert_eq!(Money::from_cents(10050).amount(), dec!(100.50));
    }

    #[test]
    fn test_zero_creates_zero_amount() {
        let m = Money::zero();
        assert!(m.is_zero());
        assert!(!m.is_positive());
    }

    #[test]
    fn test_negative_amount_is_rejected() {
        let result = Money::new(dec!(-100.00));
        assert!(matches!(result, Err(MoneyError::Negative(_))));
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_checked_add() {
        let a = Money::new(dec!(100.10)).unwrap();
        let b = Money::new(dec!(50.05)).unwrap();
        assert_eq!(a.checked_add(&b).unwrap().amount(), dec!(150.15));
    }

    #[test]
    fn test_checked_sub() {
        let a = Money::new(dec!(100.00)).unwrap();
        let b = Money::new(dec!(0.01)).unwrap();
        assert_eq!(a.checked_sub(&b).unwrap().amount(), dec!(99.99));
    }

    #[test]
    fn test_checked_sub_below_zero_fails() {
        let a = Money::new(dec!(1.00)).unwrap();
        let b = Money::new(dec!(2.00)).unwrap();
        assert_eq!(a.checked_sub(&b), Err(MoneyError::Negative(dec!(-1.00))));
    }

    #[test]
    fn test_multiply_rounds_each_step() {
        // 33.33 * 0.333 = 11.09889 -> 11.10
        let m = Money::new(dec!(33.33)).unwrap();
        assert_eq!(m.multiply(dec!(0.333)).unwrap().amount(), dec!(11.10));
    }

    #[test]
    fn test_apply_percentage() {
        let value = Money::new(dec!(50000.00)).unwrap();
        let rate = Percentage::new(dec!(0.05));
        assert_eq!(value.apply(rate).unwrap().amount(), dec!(2500.00));
    }

    #[test]
    fn test_whole_steps_truncates() {
        let value = Money::new(dec!(59999.99)).unwrap();
        assert_eq!(value.whole_steps(dec!(10000)).unwrap(), dec!(5));
    }

    #[test]
    fn test_whole_steps_by_zero_fails() {
        let value = Money::new(dec!(10.00)).unwrap();
        assert_eq!(value.whole_steps(Decimal::ZERO), Err(MoneyError::DivisionByZero));
    }
}

mod percentage {
    use super::*;

    #[test]
    fn test_rounds_to_five_places() {
        assert_eq!(Percentage::new(dec!(0.123456)).value(), dec!(0.12346));
        assert_eq!(Percentage::new(dec!(0.123454)).value(), dec!(0.12345));
    }

    #[test]
    fn test_rate_components_may_be_negative() {
        let p = Percentage::new(dec!(-0.01));
        assert_eq!(p.value(), dec!(-0.01));
    }

    #[test]
    fn test_fraction_accepts_inclusive_bounds() {
        assert_eq!(Percentage::fraction(dec!(0)).unwrap(), Percentage::zero());
        assert_eq!(Percentage::fraction(dec!(1)).unwrap().value(), dec!(1));
    }

    #[test]
    fn test_fraction_rejects_values_outside_unit_range() {
        assert!(matches!(
            Percentage::fraction(dec!(1.5)),
            Err(MoneyError::OutOfUnitRange(_))
        ));
    }

    #[test]
    fn test_times_and_add() {
        let age = Percentage::new(dec!(0.005)).times(dec!(5)).unwrap();
        let total = age.checked_add(&Percentage::new(dec!(0.025))).unwrap();
        assert_eq!(total.value(), dec!(0.05));
    }
}

mod equality_and_serde {
    use super::*;

    #[test]
    fn test_equality_is_structural() {
        assert_eq!(Money::new(dec!(10)).unwrap(), Money::new(dec!(10.000)).unwrap());
        assert_eq!(Percentage::new(dec!(0.1)), Percentage::new(dec!(0.10000)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::new(dec!(1234.5)).unwrap().to_string(), "R$ 1234.50");
    }

    #[test]
    fn test_deserialize_rejects_negative_money() {
        let result: Result<Money, _> = serde_json::from_str("\"-5.00\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_serde_keeps_value() {
        let m = Money::new(dec!(2350.00)).unwrap();
        let json = serde_json::to_string(&m).unwrap();
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(m, back);
    }
}
