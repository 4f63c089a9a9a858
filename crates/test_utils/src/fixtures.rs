//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for calculations. The reference scenario
//! is a five-year-old vehicle worth 50,000.00 with a 10% deductible and a
//! 100.00 broker fee, which prices at 2,350.00 without an address and
//! 3,250.00 when registered in SP.

use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use core_kernel::{Money, Percentage};
use domain_rating::{AddressData, CalculationInput, RatingConfig};

static REFERENCE_CONFIG: Lazy<Arc<RatingConfig>> =
    Lazy::new(|| Arc::new(RatingConfig::default().with_gis_rate("SP", dec!(0.02))));

/// Fixture for rating parameters
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// Built-in defaults plus a 2% regional adjustment for SP
    pub fn reference() -> Arc<RatingConfig> {
        REFERENCE_CONFIG.clone()
    }
}

/// Fixture for money and percentages
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn car_value() -> Money {
        Money::from_cents(5_000_000)
    }

    pub fn broker_fee() -> Money {
        Money::from_cents(10_000)
    }

    pub fn deductible() -> Percentage {
        Percentage::new(dec!(0.10))
    }

    /// Premium of the reference scenario without an address
    pub fn expected_premium() -> Decimal {
        dec!(2350.00)
    }

    /// Policy limit of the reference scenario without an address
    pub fn expected_policy_limit() -> Decimal {
        dec!(49750.00)
    }
}

/// Fixture for addresses
pub struct AddressFixtures;

impl AddressFixtures {
    /// An address in São Paulo state
    pub fn sao_paulo() -> AddressData {
        AddressData {
            street: "Avenida Paulista".to_string(),
            number: "1578".to_string(),
            complement: None,
            neighborhood: "Bela Vista".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
            postal_code: "01310-200".to_string(),
            country: Some("BR".to_string()),
        }
    }

    /// An address in a state without regional adjustment
    pub fn rio_de_janeiro() -> AddressData {
        AddressData {
            street: "Avenida Atlântica".to_string(),
            number: "1702".to_string(),
            complement: Some("Bloco B".to_string()),
            neighborhood: "Copacabana".to_string(),
            city: "Rio de Janeiro".to_string(),
            state: "RJ".to_string(),
            postal_code: "22021001".to_string(),
            country: None,
        }
    }
}

/// Fixture for use case inputs
pub struct InputFixtures;

impl InputFixtures {
    /// The reference scenario, model year five years before the current year
    pub fn reference() -> CalculationInput {
        CalculationInput {
            make: "Toyota".to_string(),
            model: "Corolla".to_string(),
            year: Utc::now().year() - 5,
            value: dec!(50000.00),
            deductible_percentage: dec!(0.10),
            broker_fee: dec!(100.00),
            registration_address: None,
        }
    }

    /// The reference scenario registered in SP
    pub fn reference_in_sao_paulo() -> CalculationInput {
        CalculationInput {
            registration_address: Some(AddressFixtures::sao_paulo()),
            ..Self::reference()
        }
    }
}
