//! Rate composition
//!
//! Combines the base rate with the vehicle age term, the value step term and
//! the optional regional term into one effective rate. The computation is a
//! pure function of the inputs and the parameter table.

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

use core_kernel::{MoneyError, Percentage};

use crate::address::Address;
use crate::car::CarInfo;
use crate::config::RatingConfig;
use crate::error::RatingError;

/// Result of composing a rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposedRate {
    /// Effective rate applied to the vehicle value
    pub rate: Percentage,
    /// Regional component, present only when an address was given
    pub gis_adjustment: Option<Percentage>,
}

/// Composes the effective rate for a vehicle
#[derive(Debug, Clone)]
pub struct RateComposer {
    config: Arc<RatingConfig>,
}

impl RateComposer {
    pub fn new(config: Arc<RatingConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RatingConfig {
        &self.config
    }

    /// Composes the rate using the current calendar year
    pub fn compose(&self, car: &CarInfo, address: Option<&Address>) -> Result<ComposedRate, RatingError> {
        self.compose_as_of(car, address, Utc::now().year())
    }

    /// Composes the rate against an explicit current year
    ///
    /// The composed rate has no upper bound.
    pub fn compose_as_of(
        &self,
        car: &CarInfo,
        address: Option<&Address>,
        current_year: i32,
    ) -> Result<ComposedRate, RatingError> {
        let age_years = Decimal::from(car.age_in_years(current_year));
        let steps = car
            .value()
            .whole_steps(self.config.value_adjustment_step())
            .map_err(arithmetic)?;

        let age_term = self.config.age_adjustment_rate().times(age_years).map_err(arithmetic)?;
        let value_term = self.config.value_adjustment_rate().times(steps).map_err(arithmetic)?;

        let mut rate = self
            .config
            .base_rate()
            .checked_add(&age_term)
            .and_then(|r| r.checked_add(&value_term))
            .map_err(arithmetic)?;

        let gis_adjustment = match address {
            Some(address) => {
                let gis = self.config.gis_rate(address.state());
                rate = rate.checked_add(&gis).map_err(arithmetic)?;
                Some(gis)
            }
            None => None,
        };

        Ok(ComposedRate { rate, gis_adjustment })
    }
}

fn arithmetic(error: MoneyError) -> RatingError {
    RatingError::calculation(format!("rate composition failed: {}", error))
}
