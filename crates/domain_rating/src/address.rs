//! Registration address value object

use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::CoreError;

/// Country used when the caller does not provide one
pub const DEFAULT_COUNTRY: &str = "BR";

/// Vehicle registration address
///
/// Street, number, neighborhood and city are trimmed and non-empty. State and
/// country are two upper-cased ASCII letters. The postal code is stored as
/// exactly eight digits; a `12345-678` input is accepted and normalised.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "AddressData")]
pub struct Address {
    street: String,
    number: String,
    complement: Option<String>,
    neighborhood: String,
    city: String,
    state: String,
    postal_code: String,
    country: String,
}

/// Raw address fields as received from a caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressData {
    pub street: String,
    pub number: String,
    #[serde(default)]
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default)]
    pub country: Option<String>,
}

impl Address {
    /// Validates and normalises raw address fields
    pub fn new(data: AddressData) -> Result<Self, CoreError> {
        let street = bounded_text("street", &data.street, 100)?;
        let number = bounded_text("number", &data.number, 10)?;
        let complement = match data.complement.as_deref().map(str::trim) {
            Some("") | None => None,
            Some(text) => Some(bounded_text("complement", text, 50)?),
        };
        let neighborhood = bounded_text("neighborhood", &data.neighborhood, 50)?;
        let city = bounded_text("city", &data.city, 50)?;
        let state = two_letter_code("state", &data.state)?;
        let postal_code = postal_code(&data.postal_code)?;
        let country = two_letter_code(
            "country",
            data.country.as_deref().unwrap_or(DEFAULT_COUNTRY),
        )?;

        Ok(Self {
            street,
            number,
            complement,
            neighborhood,
            city,
            state,
            postal_code,
            country,
        })
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn complement(&self) -> Option<&str> {
        self.complement.as_deref()
    }

    pub fn neighborhood(&self) -> &str {
        &self.neighborhood
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    /// Two-letter state code, the key of the regional adjustment table
    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    /// Returns the raw fields, e.g. for persistence or re-validation
    pub fn to_data(&self) -> AddressData {
        AddressData {
            street: self.street.clone(),
            number: self.number.clone(),
            complement: self.complement.clone(),
            neighborhood: self.neighborhood.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            postal_code: self.postal_code.clone(),
            country: Some(self.country.clone()),
        }
    }
}

impl TryFrom<AddressData> for Address {
    type Error = CoreError;

    fn try_from(data: AddressData) -> Result<Self, Self::Error> {
        Address::new(data)
    }
}

impl From<Address> for AddressData {
    fn from(address: Address) -> Self {
        address.to_data()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.street, self.number)?;
        if let Some(complement) = &self.complement {
            write!(f, " {}", complement)?;
        }
        write!(
            f,
            ", {}, {} - {}, {}, {}-{}",
            self.neighborhood,
            self.city,
            self.state,
            self.country,
            &self.postal_code[..5],
            &self.postal_code[5..]
        )
    }
}

fn bounded_text(field: &str, raw: &str, max: usize) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation(field, "must not be empty"));
    }
    if trimmed.chars().count() > max {
        return Err(CoreError::validation(
            field,
            format!("must be at most {} characters", max),
        ));
    }
    Ok(trimmed.to_string())
}

fn two_letter_code(field: &str, raw: &str) -> Result<String, CoreError> {
    let code = raw.trim().to_ascii_uppercase();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CoreError::validation(field, "must be exactly 2 letters"));
    }
    Ok(code)
}

fn postal_code(raw: &str) -> Result<String, CoreError> {
    let digits: String = raw.trim().chars().filter(|c| *c != '-').collect();
    if digits.len() != 8 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::validation("postal_code", "must have 8 digits"));
    }
    Ok(digits)
}
