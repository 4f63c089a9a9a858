//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! defaults for everything else.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

use core_kernel::CalculationId;
use domain_rating::{AddressData, CalculationAggregate, CalculationInput, PremiumCalculator, RatingConfig};

use crate::fixtures::{ConfigFixtures, InputFixtures};

/// Builder for use case inputs
pub struct CalculationInputBuilder {
    input: CalculationInput,
}

impl Default for CalculationInputBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CalculationInputBuilder {
    /// Starts from the reference scenario
    pub fn new() -> Self {
        Self {
            input: InputFixtures::reference(),
        }
    }

    pub fn with_car(mut self, make: impl Into<String>, model: impl Into<String>) -> Self {
        self.input.make = make.into();
        self.input.model = model.into();
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.input.year = year;
        self
    }

    pub fn with_value(mut self, value: Decimal) -> Self {
        self.input.value = value;
        self
    }

    pub fn with_deductible(mut self, percentage: Decimal) -> Self {
        self.input.deductible_percentage = percentage;
        self
    }

    pub fn with_broker_fee(mut self, fee: Decimal) -> Self {
        self.input.broker_fee = fee;
        self
    }

    pub fn with_address(mut self, address: AddressData) -> Self {
        self.input.registration_address = Some(address);
        self
    }

    pub fn without_address(mut self) -> Self {
        self.input.registration_address = None;
        self
    }

    pub fn build(self) -> CalculationInput {
        self.input
    }
}

/// Builder for fully calculated aggregates, for repository-level tests
pub struct CalculationAggregateBuilder {
    id: CalculationId,
    input: CalculationInput,
    config: Arc<RatingConfig>,
    created_at: DateTime<Utc>,
}

impl Default for CalculationAggregateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CalculationAggregateBuilder {
    pub fn new() -> Self {
        Self {
            id: CalculationId::new(),
            input: InputFixtures::reference(),
            config: ConfigFixtures::reference(),
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: CalculationId) -> Self {
        self.id = id;
        self
    }

    pub fn with_input(mut self, input: CalculationInput) -> Self {
        self.input = input;
        self
    }

    pub fn with_config(mut self, config: Arc<RatingConfig>) -> Self {
        self.config = config;
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    /// Runs the calculation and builds the aggregate
    ///
    /// # Panics
    ///
    /// Panics if the input does not pass validation
    pub fn build(self) -> CalculationAggregate {
        let inputs = self
            .input
            .into_premium_inputs()
            .expect("builder input must be valid");
        let breakdown = PremiumCalculator::new(self.config)
            .calculate(&inputs)
            .expect("builder input must be calculable");
        CalculationAggregate::create(self.id, inputs, breakdown, self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{AddressFixtures, MoneyFixtures};
    use rust_decimal_macros::dec;

    #[test]
    fn test_aggregate_builder_defaults_to_reference_premium() {
        let aggregate = CalculationAggregateBuilder::new().build();
        assert_eq!(aggregate.calculated_premium().amount(), MoneyFixtures::expected_premium());
    }

    #[test]
    fn test_input_builder_overrides() {
        let input = CalculationInputBuilder::new()
            .with_value(dec!(80000))
            .with_address(AddressFixtures::rio_de_janeiro())
            .build();
        assert_eq!(input.value, dec!(80000));
        assert_eq!(input.registration_address.unwrap().state, "RJ");
    }
}
