//! Calculation aggregate
//!
//! The persisted quote: vehicle data, computed results, optional registration
//! address and lifecycle timestamps. Identity is minted once at creation and
//! never changes. Updates replace every derived field; deletion only sets
//! `deleted_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{CalculationId, Money, Percentage};

use crate::address::Address;
use crate::car::CarInfo;
use crate::premium::{PremiumBreakdown, PremiumInputs};

/// Plain field set used to rebuild an aggregate from storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationRecord {
    pub id: CalculationId,
    pub car: CarInfo,
    pub applied_rate: Percentage,
    pub calculated_premium: Money,
    pub deductible_value: Money,
    pub policy_limit: Money,
    pub broker_fee: Money,
    pub gis_adjustment: Option<Percentage>,
    pub registration_address: Option<Address>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A stored premium calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationAggregate {
    id: CalculationId,
    car: CarInfo,
    applied_rate: Percentage,
    calculated_premium: Money,
    deductible_value: Money,
    policy_limit: Money,
    broker_fee: Money,
    gis_adjustment: Option<Percentage>,
    registration_address: Option<Address>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl CalculationAggregate {
    /// Builds a new aggregate from a finished calculation
    pub fn create(
        id: CalculationId,
        inputs: PremiumInputs,
        breakdown: PremiumBreakdown,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            car: inputs.car,
            applied_rate: breakdown.applied_rate,
            calculated_premium: breakdown.calculated_premium,
            deductible_value: breakdown.deductible_value,
            policy_limit: breakdown.policy_limit,
            broker_fee: breakdown.broker_fee,
            gis_adjustment: breakdown.gis_adjustment,
            registration_address: inputs.address,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Full replacement: new inputs and results, same identity and creation time
    pub fn replace(&self, inputs: PremiumInputs, breakdown: PremiumBreakdown, now: DateTime<Utc>) -> Self {
        Self {
            created_at: self.created_at,
            deleted_at: self.deleted_at,
            ..Self::create(self.id, inputs, breakdown, now)
        }
    }

    /// Rebuilds an aggregate read back from storage
    pub fn restore(record: CalculationRecord) -> Self {
        Self {
            id: record.id,
            car: record.car,
            applied_rate: record.applied_rate,
            calculated_premium: record.calculated_premium,
            deductible_value: record.deductible_value,
            policy_limit: record.policy_limit,
            broker_fee: record.broker_fee,
            gis_adjustment: record.gis_adjustment,
            registration_address: record.registration_address,
            created_at: record.created_at,
            updated_at: record.updated_at,
            deleted_at: record.deleted_at,
        }
    }

    /// Sets the soft-delete marker; an existing marker is kept
    pub fn mark_deleted(&mut self, at: DateTime<Utc>) {
        if self.deleted_at.is_none() {
            self.deleted_at = Some(at);
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn id(&self) -> CalculationId {
        self.id
    }

    pub fn car(&self) -> &CarInfo {
        &self.car
    }

    pub fn applied_rate(&self) -> Percentage {
        self.applied_rate
    }

    pub fn calculated_premium(&self) -> Money {
        self.calculated_premium
    }

    pub fn deductible_value(&self) -> Money {
        self.deductible_value
    }

    pub fn policy_limit(&self) -> Money {
        self.policy_limit
    }

    pub fn broker_fee(&self) -> Money {
        self.broker_fee
    }

    pub fn gis_adjustment(&self) -> Option<Percentage> {
        self.gis_adjustment
    }

    pub fn registration_address(&self) -> Option<&Address> {
        self.registration_address.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RatingConfig;
    use crate::premium::PremiumCalculator;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn inputs(value: rust_decimal::Decimal) -> PremiumInputs {
        PremiumInputs {
            car: CarInfo::new_as_of("Honda", "Civic", 2021, Money::new(value).unwrap(), 2025).unwrap(),
            deductible_percentage: Percentage::fraction(dec!(0.1)).unwrap(),
            broker_fee: Money::zero(),
            address: None,
        }
    }

    fn calculate(inputs: &PremiumInputs) -> PremiumBreakdown {
        PremiumCalculator::new(Arc::new(RatingConfig::default()))
            .calculate_as_of(inputs, 2025)
            .unwrap()
    }

    #[test]
    fn test_replace_keeps_identity_and_creation_time() {
        let created = Utc::now();
        let first = inputs(dec!(40000));
        let original = CalculationAggregate::create(CalculationId::new(), first.clone(), calculate(&first), created);

        let second = inputs(dec!(90000));
        let later = created + Duration::minutes(5);
        let replaced = original.replace(second.clone(), calculate(&second), later);

        assert_eq!(replaced.id(), original.id());
        assert_eq!(replaced.created_at(), created);
        assert_eq!(replaced.updated_at(), later);
        assert_ne!(replaced.calculated_premium(), original.calculated_premium());
    }

    #[test]
    fn test_mark_deleted_is_sticky() {
        let now = Utc::now();
        let first = inputs(dec!(40000));
        let mut aggregate = CalculationAggregate::create(CalculationId::new(), first.clone(), calculate(&first), now);
        aggregate.mark_deleted(now);
        aggregate.mark_deleted(now + Duration::hours(1));
        assert_eq!(aggregate.deleted_at(), Some(now));
    }
}
