//! Calculation DTOs
//!
//! Requests carry a flat car description plus commercial parameters. Shape
//! checks (text lengths, year floor, code sizes) run here through `validator`;
//! numeric ranges and configured limits are enforced by the domain.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_rating::{AddressData, CalculationAggregate, CalculationInput, DEFAULT_PAGE_LIMIT};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CalculationRequest {
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub make: String,
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub model: String,
    #[validate(range(min = 1900, message = "must be 1900 or later"))]
    pub year: i32,
    pub value: Decimal,
    pub deductible_percentage: Decimal,
    pub broker_fee: Decimal,
    #[validate(nested)]
    #[serde(default)]
    pub registration_location: Option<AddressRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddressRequest {
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub street: String,
    #[validate(length(min = 1, max = 10, message = "must be between 1 and 10 characters"))]
    pub number: String,
    #[validate(length(max = 50, message = "must be at most 50 characters"))]
    #[serde(default)]
    pub complement: Option<String>,
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub neighborhood: String,
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub city: String,
    #[validate(length(equal = 2, message = "must be a two-letter code"))]
    pub state: String,
    #[validate(length(min = 8, max = 9, message = "must be 8 digits, optionally as 12345-678"))]
    pub postal_code: String,
    #[validate(length(equal = 2, message = "must be a two-letter code"))]
    #[serde(default)]
    pub country: Option<String>,
}

impl From<AddressRequest> for AddressData {
    fn from(request: AddressRequest) -> Self {
        AddressData {
            street: request.street,
            number: request.number,
            complement: request.complement,
            neighborhood: request.neighborhood,
            city: request.city,
            state: request.state,
            postal_code: request.postal_code,
            country: request.country,
        }
    }
}

impl From<CalculationRequest> for CalculationInput {
    fn from(request: CalculationRequest) -> Self {
        CalculationInput {
            make: request.make,
            model: request.model,
            year: request.year,
            value: request.value,
            deductible_percentage: request.deductible_percentage,
            broker_fee: request.broker_fee,
            registration_address: request.registration_location.map(AddressData::from),
        }
    }
}

/// Pagination query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn offset_or_default(&self) -> u32 {
        self.offset.unwrap_or(0)
    }

    pub fn limit_or_default(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResponse {
    pub id: Uuid,
    pub car_make: String,
    pub car_model: String,
    pub car_year: i32,
    pub car_value: Decimal,
    pub applied_rate: Decimal,
    pub calculated_premium: Decimal,
    pub deductible_value: Decimal,
    pub policy_limit: Decimal,
    pub broker_fee: Decimal,
    pub gis_adjustment: Option<Decimal>,
    pub registration_location: Option<AddressData>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&CalculationAggregate> for CalculationResponse {
    fn from(calculation: &CalculationAggregate) -> Self {
        let car = calculation.car();
        Self {
            id: *calculation.id().as_uuid(),
            car_make: car.make().to_string(),
            car_model: car.model().to_string(),
            car_year: car.year(),
            car_value: car.value().amount(),
            applied_rate: calculation.applied_rate().value(),
            calculated_premium: calculation.calculated_premium().amount(),
            deductible_value: calculation.deductible_value().amount(),
            policy_limit: calculation.policy_limit().amount(),
            broker_fee: calculation.broker_fee().amount(),
            gis_adjustment: calculation.gis_adjustment().map(|p| p.value()),
            registration_location: calculation.registration_address().map(|a| a.to_data()),
            created_at: calculation.created_at(),
            updated_at: calculation.updated_at(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request() -> CalculationRequest {
        CalculationRequest {
            make: "Toyota".to_string(),
            model: "Corolla".to_string(),
            year: 2020,
            value: dec!(50000),
            deductible_percentage: dec!(0.1),
            broker_fee: dec!(100),
            registration_location: None,
        }
    }

    #[test]
    fn test_shape_validation() {
        assert!(request().validate().is_ok());

        let mut blank = request();
        blank.make = String::new();
        assert!(blank.validate().is_err());

        let mut old = request();
        old.year = 1899;
        assert!(old.validate().is_err());
    }

    #[test]
    fn test_nested_address_is_validated() {
        let mut with_address = request();
        with_address.registration_location = Some(AddressRequest {
            street: "Rua A".to_string(),
            number: "1".to_string(),
            complement: None,
            neighborhood: "Centro".to_string(),
            city: "Curitiba".to_string(),
            state: "PRN".to_string(),
            postal_code: "80010-000".to_string(),
            country: None,
        });
        let errors = with_address.validate().unwrap_err();
        assert!(errors.errors().contains_key("registration_location"));
    }

    #[test]
    fn test_request_maps_to_input() {
        let input = CalculationInput::from(request());
        assert_eq!(input.make, "Toyota");
        assert_eq!(input.deductible_percentage, dec!(0.1));
        assert!(input.registration_address.is_none());
    }
}
