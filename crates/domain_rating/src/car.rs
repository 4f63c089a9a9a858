//! Vehicle description value object

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{CoreError, Money};

/// Oldest model year accepted by the system
pub const MIN_MODEL_YEAR: i32 = 1900;

/// Maximum length of make and model names
pub const MAX_NAME_LENGTH: usize = 50;

/// The insured vehicle
///
/// Make and model are trimmed and non-empty, the model year lies in
/// `1900..=current_year + 1`, and the market value is strictly positive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "CarInfoData")]
pub struct CarInfo {
    make: String,
    model: String,
    year: i32,
    value: Money,
}

impl CarInfo {
    /// Creates a validated CarInfo using the current calendar year
    pub fn new(
        make: impl Into<String>,
        model: impl Into<String>,
        year: i32,
        value: Money,
    ) -> Result<Self, CoreError> {
        Self::new_as_of(make, model, year, value, Utc::now().year())
    }

    /// Creates a validated CarInfo against an explicit current year
    pub fn new_as_of(
        make: impl Into<String>,
        model: impl Into<String>,
        year: i32,
        value: Money,
        current_year: i32,
    ) -> Result<Self, CoreError> {
        let make = required_name("make", make.into())?;
        let model = required_name("model", model.into())?;

        if year < MIN_MODEL_YEAR {
            return Err(CoreError::validation(
                "year",
                format!("{} is before {}", year, MIN_MODEL_YEAR),
            ));
        }
        if year > current_year + 1 {
            return Err(CoreError::validation(
                "year",
                format!("{} is after {}", year, current_year + 1),
            ));
        }
        if !value.is_positive() {
            return Err(CoreError::validation("value", "must be greater than zero"));
        }

        Ok(Self { make, model, year, value })
    }

    pub fn make(&self) -> &str {
        &self.make
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn value(&self) -> Money {
        self.value
    }

    /// Whole years since the model year, clamped at zero for future models
    pub fn age_in_years(&self, current_year: i32) -> u32 {
        (current_year - self.year).max(0) as u32
    }
}

impl fmt::Display for CarInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.make, self.model, self.year)
    }
}

fn required_name(field: &str, raw: String) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation(field, "must not be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(CoreError::validation(
            field,
            format!("must be at most {} characters", MAX_NAME_LENGTH),
        ));
    }
    Ok(trimmed.to_string())
}

#[derive(Deserialize)]
struct CarInfoData {
    make: String,
    model: String,
    year: i32,
    value: Money,
}

impl TryFrom<CarInfoData> for CarInfo {
    type Error = CoreError;

    fn try_from(data: CarInfoData) -> Result<Self, Self::Error> {
        CarInfo::new(data.make, data.model, data.year, data.value)
    }
}
