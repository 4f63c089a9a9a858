//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for calculations that give
//! more meaningful error messages than standard assertions.

use rust_decimal::Decimal;

use core_kernel::Money;
use domain_rating::CalculationAggregate;

/// Asserts that a Money value has exactly the expected amount
pub fn assert_money_eq(actual: Money, expected: Decimal) {
    assert_eq!(
        actual.amount(),
        expected,
        "Money mismatch: actual={}, expected={}",
        actual,
        expected
    );
}

/// Asserts that the stored results agree with the premium formula
///
/// Checks `premium = base - deductible + fee` where `base` is recovered as
/// `car.value * applied_rate` rounded to cents.
pub fn assert_calculation_consistent(calculation: &CalculationAggregate) {
    let base = calculation
        .car()
        .value()
        .apply(calculation.applied_rate())
        .expect("base premium must be derivable");
    let expected = base.amount() - calculation.deductible_value().amount() + calculation.broker_fee().amount();
    assert_eq!(
        calculation.calculated_premium().amount(),
        expected,
        "Premium {} does not match base {} - deductible {} + fee {}",
        calculation.calculated_premium(),
        base,
        calculation.deductible_value(),
        calculation.broker_fee()
    );
    assert!(
        calculation.deductible_value() <= base,
        "Deductible {} exceeds base premium {}",
        calculation.deductible_value(),
        base
    );
}

/// Asserts that two calculations carry the same inputs and results,
/// ignoring timestamps
pub fn assert_same_calculation(actual: &CalculationAggregate, expected: &CalculationAggregate) {
    assert_eq!(actual.id(), expected.id(), "id mismatch");
    assert_eq!(actual.car(), expected.car(), "car mismatch");
    assert_eq!(actual.applied_rate(), expected.applied_rate(), "rate mismatch");
    assert_eq!(actual.calculated_premium(), expected.calculated_premium(), "premium mismatch");
    assert_eq!(actual.deductible_value(), expected.deductible_value(), "deductible mismatch");
    assert_eq!(actual.policy_limit(), expected.policy_limit(), "policy limit mismatch");
    assert_eq!(actual.broker_fee(), expected.broker_fee(), "broker fee mismatch");
    assert_eq!(actual.gis_adjustment(), expected.gis_adjustment(), "gis adjustment mismatch");
    assert_eq!(
        actual.registration_address(),
        expected.registration_address(),
        "address mismatch"
    );
}
