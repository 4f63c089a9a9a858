//! Calculation use cases
//!
//! Orchestrates validation, premium calculation and storage for the
//! create/get/list/update/delete operations. Each call is one independent
//! unit of work; the only suspension points are repository calls.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use core_kernel::{CalculationId, Money, Percentage};

use crate::address::{Address, AddressData};
use crate::aggregate::CalculationAggregate;
use crate::car::CarInfo;
use crate::config::RatingConfig;
use crate::error::RatingError;
use crate::ports::{CalculationRepository, PageRequest, SoftDeleteOutcome};
use crate::premium::{PremiumCalculator, PremiumInputs};

/// Unvalidated inputs for creating or replacing a calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationInput {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub value: Decimal,
    pub deductible_percentage: Decimal,
    pub broker_fee: Decimal,
    #[serde(default)]
    pub registration_address: Option<AddressData>,
}

impl CalculationInput {
    /// Validates every field into the calculator's value objects
    pub fn into_premium_inputs(self) -> Result<PremiumInputs, RatingError> {
        let value = Money::new(self.value).map_err(|e| RatingError::validation("value", e.to_string()))?;
        let car = CarInfo::new(self.make, self.model, self.year, value)?;
        let deductible_percentage = Percentage::fraction(self.deductible_percentage)
            .map_err(|e| RatingError::validation("deductible_percentage", e.to_string()))?;
        let broker_fee =
            Money::new(self.broker_fee).map_err(|e| RatingError::validation("broker_fee", e.to_string()))?;
        let address = self.registration_address.map(Address::new).transpose()?;

        Ok(PremiumInputs {
            car,
            deductible_percentage,
            broker_fee,
            address,
        })
    }
}

/// Application service for premium calculations
#[derive(Clone)]
pub struct CalculationService {
    repository: Arc<dyn CalculationRepository>,
    calculator: PremiumCalculator,
}

impl CalculationService {
    pub fn new(repository: Arc<dyn CalculationRepository>, config: Arc<RatingConfig>) -> Self {
        Self {
            repository,
            calculator: PremiumCalculator::new(config),
        }
    }

    pub fn calculator(&self) -> &PremiumCalculator {
        &self.calculator
    }

    /// Calculates and stores a new calculation under a fresh id
    pub async fn create_calculation(&self, input: CalculationInput) -> Result<CalculationAggregate, RatingError> {
        self.create_calculation_with_id(CalculationId::new(), input).await
    }

    /// Calculates and stores a new calculation under a caller-supplied id
    ///
    /// A retried create with the same id fails with `RatingError::Duplicate`.
    #[instrument(skip(self, input), fields(calculation_id = %id))]
    pub async fn create_calculation_with_id(
        &self,
        id: CalculationId,
        input: CalculationInput,
    ) -> Result<CalculationAggregate, RatingError> {
        let inputs = input.into_premium_inputs()?;
        let breakdown = self.calculator.calculate(&inputs)?;
        let aggregate = CalculationAggregate::create(id, inputs, breakdown, Utc::now());

        self.repository
            .save(&aggregate)
            .await
            .map_err(|e| RatingError::from_port(id, e))?;

        info!(premium = %aggregate.calculated_premium(), rate = %aggregate.applied_rate(), "Calculation created");
        Ok(aggregate)
    }

    /// Retrieves an active calculation
    #[instrument(skip(self), fields(calculation_id = %id))]
    pub async fn get_calculation(&self, id: CalculationId) -> Result<CalculationAggregate, RatingError> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(|e| RatingError::from_port(id, e))?
            .ok_or(RatingError::NotFound(id))
    }

    /// Lists active calculations, newest first
    #[instrument(skip(self))]
    pub async fn list_calculations(&self, page: PageRequest) -> Result<Vec<CalculationAggregate>, RatingError> {
        Ok(self.repository.list_active(page).await?)
    }

    /// Recomputes every derived field from new inputs and replaces the calculation
    #[instrument(skip(self, input), fields(calculation_id = %id))]
    pub async fn update_calculation(
        &self,
        id: CalculationId,
        input: CalculationInput,
    ) -> Result<CalculationAggregate, RatingError> {
        let inputs = input.into_premium_inputs()?;
        let existing = self.get_calculation(id).await?;
        let breakdown = self.calculator.calculate(&inputs)?;
        let replaced = existing.replace(inputs, breakdown, Utc::now());

        self.repository
            .update(&replaced)
            .await
            .map_err(|e| RatingError::from_port(id, e))?;

        info!(premium = %replaced.calculated_premium(), "Calculation updated");
        Ok(replaced)
    }

    /// Soft-deletes a calculation; deleting twice is not an error
    #[instrument(skip(self), fields(calculation_id = %id))]
    pub async fn delete_calculation(&self, id: CalculationId) -> Result<(), RatingError> {
        let outcome = self
            .repository
            .soft_delete(id, Utc::now())
            .await
            .map_err(|e| RatingError::from_port(id, e))?;

        match outcome {
            SoftDeleteOutcome::Deleted => {
                info!("Calculation deleted");
                Ok(())
            }
            SoftDeleteOutcome::AlreadyDeleted => {
                info!("Calculation was already deleted");
                Ok(())
            }
            SoftDeleteOutcome::NotFound => {
                warn!("Delete requested for unknown calculation");
                Err(RatingError::NotFound(id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input() -> CalculationInput {
        CalculationInput {
            make: "Toyota".into(),
            model: "Corolla".into(),
            year: 2020,
            value: dec!(50000),
            deductible_percentage: dec!(0.1),
            broker_fee: dec!(100),
            registration_address: None,
        }
    }

    #[test]
    fn test_negative_broker_fee_names_field() {
        let mut raw = input();
        raw.broker_fee = dec!(-1);
        match raw.into_premium_inputs() {
            Err(RatingError::Validation(e)) => assert_eq!(e.field(), Some("broker_fee")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_deductible_above_one_rejected() {
        let mut raw = input();
        raw.deductible_percentage = dec!(1.01);
        assert!(raw.into_premium_inputs().unwrap_err().is_validation());
    }
}
