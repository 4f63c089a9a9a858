//! Premium calculation
//!
//! Derives the premium, deductible value and policy limit from the composed
//! rate:
//!
//! ```text
//! base_premium       = car.value * rate
//! deductible_value   = base_premium * deductible_percentage
//! calculated_premium = base_premium - deductible_value + broker_fee
//! policy_limit       = car.value * coverage_percentage - base_premium * deductible_percentage
//! ```
//!
//! Every intermediate amount is rounded half-up to cents.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use core_kernel::{CoreError, Money, MoneyError, Percentage};

use crate::address::Address;
use crate::car::CarInfo;
use crate::config::{RatingConfig, RatingLimits};
use crate::error::RatingError;
use crate::rate::RateComposer;

/// Everything the calculator needs for one quote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PremiumInputs {
    pub car: CarInfo,
    pub deductible_percentage: Percentage,
    pub broker_fee: Money,
    pub address: Option<Address>,
}

/// Fully populated result of a premium calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumBreakdown {
    pub applied_rate: Percentage,
    pub base_premium: Money,
    pub deductible_value: Money,
    pub calculated_premium: Money,
    pub policy_limit: Money,
    pub broker_fee: Money,
    pub gis_adjustment: Option<Percentage>,
}

/// Computes premiums from the rating parameter table
#[derive(Debug, Clone)]
pub struct PremiumCalculator {
    composer: RateComposer,
}

impl PremiumCalculator {
    pub fn new(config: Arc<RatingConfig>) -> Self {
        Self {
            composer: RateComposer::new(config),
        }
    }

    pub fn config(&self) -> &RatingConfig {
        self.composer.config()
    }

    /// Calculates a premium using the current calendar year
    pub fn calculate(&self, inputs: &PremiumInputs) -> Result<PremiumBreakdown, RatingError> {
        self.calculate_as_of(inputs, Utc::now().year())
    }

    /// Calculates a premium against an explicit current year
    ///
    /// # Errors
    ///
    /// - `RatingError::Validation` if the inputs break a configured business limit
    /// - `RatingError::Calculation` if a derived amount would be negative
    pub fn calculate_as_of(
        &self,
        inputs: &PremiumInputs,
        current_year: i32,
    ) -> Result<PremiumBreakdown, RatingError> {
        check_limits(inputs, self.config().limits())?;

        let composed = self
            .composer
            .compose_as_of(&inputs.car, inputs.address.as_ref(), current_year)?;
        let car_value = inputs.car.value();

        let base_premium = car_value
            .apply(composed.rate)
            .map_err(|e| derived("base premium", e))?;
        let deductible_value = base_premium
            .apply(inputs.deductible_percentage)
            .map_err(|e| derived("deductible value", e))?;
        let calculated_premium = base_premium
            .checked_sub(&deductible_value)
            .and_then(|net| net.checked_add(&inputs.broker_fee))
            .map_err(|e| derived("premium", e))?;

        let covered = car_value
            .apply(self.config().coverage_percentage())
            .map_err(|e| derived("covered value", e))?;
        let policy_limit = covered
            .checked_sub(&deductible_value)
            .map_err(|e| derived("policy limit", e))?;

        debug!(
            rate = %composed.rate,
            premium = %calculated_premium,
            policy_limit = %policy_limit,
            "Premium calculated"
        );

        Ok(PremiumBreakdown {
            applied_rate: composed.rate,
            base_premium,
            deductible_value,
            calculated_premium,
            policy_limit,
            broker_fee: inputs.broker_fee,
            gis_adjustment: composed.gis_adjustment,
        })
    }
}

fn derived(what: &str, error: MoneyError) -> RatingError {
    RatingError::calculation(format!("{} cannot be derived: {}", what, error))
}

fn check_limits(inputs: &PremiumInputs, limits: &RatingLimits) -> Result<(), CoreError> {
    if inputs.car.year() < limits.min_car_year {
        return Err(CoreError::validation(
            "year",
            format!("must be {} or later", limits.min_car_year),
        ));
    }
    if inputs.car.value().amount() > limits.max_car_value {
        return Err(CoreError::validation(
            "value",
            format!("must not exceed {}", limits.max_car_value),
        ));
    }

    let deductible = inputs.deductible_percentage.value();
    if deductible < limits.min_deductible_percentage || deductible > limits.max_deductible_percentage {
        return Err(CoreError::validation(
            "deductible_percentage",
            format!(
                "must be between {} and {}",
                limits.min_deductible_percentage, limits.max_deductible_percentage
            ),
        ));
    }

    let fee = inputs.broker_fee.amount();
    if fee < limits.min_broker_fee || fee > limits.max_broker_fee {
        return Err(CoreError::validation(
            "broker_fee",
            format!(
                "must be between {} and {}",
                limits.min_broker_fee, limits.max_broker_fee
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn inputs(value: rust_decimal::Decimal) -> PremiumInputs {
        PremiumInputs {
            car: CarInfo::new_as_of("VW", "Gol", 2020, Money::new(value).unwrap(), 2025).unwrap(),
            deductible_percentage: Percentage::fraction(dec!(0.10)).unwrap(),
            broker_fee: Money::new(dec!(100)).unwrap(),
            address: None,
        }
    }

    #[test]
    fn test_breakdown_keeps_broker_fee() {
        let calculator = PremiumCalculator::new(Arc::new(RatingConfig::default()));
        let breakdown = calculator.calculate_as_of(&inputs(dec!(50000)), 2025).unwrap();
        assert_eq!(breakdown.broker_fee.amount(), dec!(100.00));
        assert_eq!(breakdown.base_premium.amount(), dec!(2500.00));
    }

    #[test]
    fn test_car_value_above_limit_is_rejected() {
        let calculator = PremiumCalculator::new(Arc::new(RatingConfig::default()));
        let err = calculator.calculate_as_of(&inputs(dec!(1000000.01)), 2025).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_negative_rate_is_calculation_error() {
        let config = RatingConfig::default().with_base_rate(dec!(-1));
        let calculator = PremiumCalculator::new(Arc::new(config));
        let err = calculator.calculate_as_of(&inputs(dec!(50000)), 2025).unwrap_err();
        assert!(matches!(err, RatingError::Calculation(_)));
    }
}
