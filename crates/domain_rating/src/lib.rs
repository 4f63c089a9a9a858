//! Rating Domain
//!
//! This crate prices automotive insurance and manages stored quotes:
//!
//! - **Value objects**: [`CarInfo`] and [`Address`], validated at construction
//! - **Parameters**: [`RatingConfig`], loaded once from defaults, a JSON file
//!   and the environment
//! - **Rate composition**: base, age, value-step and regional terms
//! - **Premium calculation**: premium, deductible value and policy limit
//! - **Aggregate**: [`CalculationAggregate`] with soft delete
//! - **Use cases**: [`CalculationService`] over a [`CalculationRepository`]
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_rating::{CalculationInput, CalculationService, RatingConfig};
//!
//! let config = Arc::new(RatingConfig::from_environment()?);
//! let service = CalculationService::new(repository, config);
//! let calculation = service.create_calculation(input).await?;
//! println!("Premium: {}", calculation.calculated_premium());
//! ```

pub mod address;
pub mod aggregate;
pub mod car;
pub mod config;
pub mod error;
pub mod ports;
pub mod premium;
pub mod rate;
pub mod services;

pub use address::{Address, AddressData, DEFAULT_COUNTRY};
pub use aggregate::{CalculationAggregate, CalculationRecord};
pub use car::CarInfo;
pub use config::{ConfigError, RatingConfig, RatingLimits};
pub use error::RatingError;
pub use ports::{CalculationRepository, PageRequest, SoftDeleteOutcome, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
pub use premium::{PremiumBreakdown, PremiumCalculator, PremiumInputs};
pub use rate::{ComposedRate, RateComposer};
pub use services::{CalculationInput, CalculationService};

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::InMemoryCalculationRepository;
