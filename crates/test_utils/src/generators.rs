//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use chrono::{Datelike, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::{Money, Percentage};
use domain_rating::{AddressData, CalculationInput};

/// Strategy for positive money amounts up to 1,000,000.00
pub fn car_value_strategy() -> impl Strategy<Value = Money> {
    (1u64..=100_000_000u64).prop_map(Money::from_cents)
}

/// Strategy for broker fees within the default limits
pub fn broker_fee_strategy() -> impl Strategy<Value = Money> {
    (0u64..=1_000_000u64).prop_map(Money::from_cents)
}

/// Strategy for deductible percentages in `[0, 1]` with five decimals
pub fn deductible_strategy() -> impl Strategy<Value = Percentage> {
    (0u32..=100_000u32).prop_map(|n| Percentage::new(Decimal::new(n as i64, 5)))
}

/// Strategy for model years from 1900 to next year
pub fn model_year_strategy() -> impl Strategy<Value = i32> {
    1900..=Utc::now().year() + 1
}

/// Strategy for two-letter Brazilian state codes
pub fn state_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("SP".to_string()),
        Just("RJ".to_string()),
        Just("MG".to_string()),
        Just("PR".to_string()),
        Just("RS".to_string()),
        Just("BA".to_string()),
    ]
}

/// Strategy for valid addresses
pub fn address_strategy() -> impl Strategy<Value = AddressData> {
    (state_strategy(), "[0-9]{8}", "[A-Za-z]{3,20}").prop_map(|(state, postal_code, city)| AddressData {
        street: "Rua Teste".to_string(),
        number: "100".to_string(),
        complement: None,
        neighborhood: "Centro".to_string(),
        city,
        state,
        postal_code,
        country: None,
    })
}

/// Strategy for inputs that pass validation under the default limits
pub fn calculation_input_strategy() -> impl Strategy<Value = CalculationInput> {
    (
        model_year_strategy(),
        car_value_strategy(),
        deductible_strategy(),
        broker_fee_strategy(),
        proptest::option::of(address_strategy()),
    )
        .prop_map(|(year, value, deductible, fee, address)| CalculationInput {
            make: "Fiat".to_string(),
            model: "Strada".to_string(),
            year,
            value: value.amount(),
            deductible_percentage: deductible.value(),
            broker_fee: fee.amount(),
            registration_address: address,
        })
}
