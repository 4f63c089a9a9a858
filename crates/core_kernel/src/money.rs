//! Money and percentage types with precise decimal arithmetic
//!
//! All amounts are in the implicit currency (BRL). Amounts are kept at two
//! decimal places and every arithmetic step rounds half-up back to two places,
//! so a chain of operations never accumulates binary floating-point drift.
//! Percentages are kept at five decimal places.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// ISO 4217 code of the only supported currency
pub const CURRENCY_CODE: &str = "BRL";

/// Display symbol of the only supported currency
pub const CURRENCY_SYMBOL: &str = "R$";

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Amount cannot be negative: {0}")]
    Negative(Decimal),

    #[error("Percentage must be between 0 and 1, got {0}")]
    OutOfUnitRange(Decimal),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Overflow during calculation")]
    Overflow,
}

/// A non-negative monetary amount with two decimal places
///
/// Construction rounds half-up to cents and rejects negative amounts, so every
/// `Money` in the system is valid by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money {
    amount: Decimal,
}

impl Money {
    /// Number of decimal places kept for every amount
    pub const SCALE: u32 = 2;

    /// Creates a new Money value, rounding half-up to cents
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Negative` if the rounded amount is below zero
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        let rounded = round_half_up(amount, Self::SCALE);
        if rounded.is_sign_negative() && !rounded.is_zero() {
            return Err(MoneyError::Negative(rounded));
        }
        // Normalise -0.00 and fix the scale so equality is structural.
        let mut amount = rounded.abs();
        amount.rescale(Self::SCALE);
        Ok(Self { amount })
    }

    /// Creates Money from an integer amount of cents
    pub fn from_cents(cents: u64) -> Self {
        let mut amount = Decimal::from(cents) / Decimal::ONE_HUNDRED;
        amount.rescale(Self::SCALE);
        Self { amount }
    }

    /// Creates a zero amount
    pub fn zero() -> Self {
        Self::from_cents(0)
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is strictly positive
    pub fn is_positive(&self) -> bool {
        !self.amount.is_zero()
    }

    /// Checked addition
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        let sum = self
            .amount
            .checked_add(other.amount)
            .ok_or(MoneyError::Overflow)?;
        Self::new(sum)
    }

    /// Checked subtraction
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Negative` when `other` is larger than `self`
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        let difference = self
            .amount
            .checked_sub(other.amount)
            .ok_or(MoneyError::Overflow)?;
        Self::new(difference)
    }

    /// Multiplies by a scalar factor, rounding the product to cents
    pub fn multiply(&self, factor: Decimal) -> Result<Money, MoneyError> {
        let product = self
            .amount
            .checked_mul(factor)
            .ok_or(MoneyError::Overflow)?;
        Self::new(product)
    }

    /// Applies a percentage to this amount (e.g. `value * rate`)
    pub fn apply(&self, percentage: Percentage) -> Result<Money, MoneyError> {
        self.multiply(percentage.value())
    }

    /// Number of whole `step`s contained in this amount, truncated toward zero
    pub fn whole_steps(&self, step: Decimal) -> Result<Decimal, MoneyError> {
        if step.is_zero() {
            return Err(MoneyError::DivisionByZero);
        }
        let quotient = self
            .amount
            .checked_div(step)
            .ok_or(MoneyError::Overflow)?;
        Ok(quotient.trunc())
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Money::new(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.amount
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.2}", CURRENCY_SYMBOL, self.amount)
    }
}

/// A decimal percentage stored with five decimal places (0.05 means 5%)
///
/// Rate components are unconstrained in sign; the deductible percentage is
/// built with [`Percentage::fraction`], which enforces the `[0, 1]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Percentage {
    value: Decimal,
}

impl Percentage {
    /// Number of decimal places kept for every percentage
    pub const SCALE: u32 = 5;

    /// Creates a percentage from a decimal value, rounding half-up to 5 places
    pub fn new(value: Decimal) -> Self {
        let mut value = round_half_up(value, Self::SCALE);
        if value.is_zero() {
            value = Decimal::ZERO;
        }
        value.rescale(Self::SCALE);
        Self { value }
    }

    /// Creates a percentage that must lie within `[0, 1]`
    pub fn fraction(value: Decimal) -> Result<Self, MoneyError> {
        let percentage = Self::new(value);
        if percentage.value < Decimal::ZERO || percentage.value > Decimal::ONE {
            return Err(MoneyError::OutOfUnitRange(percentage.value));
        }
        Ok(percentage)
    }

    /// The zero percentage
    pub fn zero() -> Self {
        Self::new(Decimal::ZERO)
    }

    /// Returns the decimal value (0.05 for 5%)
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Returns the value expressed in percent points (5 for 0.05)
    pub fn as_percent_points(&self) -> Decimal {
        self.value * Decimal::ONE_HUNDRED
    }

    /// Checked addition of two percentages
    pub fn checked_add(&self, other: &Percentage) -> Result<Percentage, MoneyError> {
        let sum = self
            .value
            .checked_add(other.value)
            .ok_or(MoneyError::Overflow)?;
        Ok(Self::new(sum))
    }

    /// Multiplies by a scalar count (e.g. years of age)
    pub fn times(&self, count: Decimal) -> Result<Percentage, MoneyError> {
        let product = self
            .value
            .checked_mul(count)
            .ok_or(MoneyError::Overflow)?;
        Ok(Self::new(product))
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<Decimal> for Percentage {
    fn from(value: Decimal) -> Self {
        Percentage::new(value)
    }
}

impl From<Percentage> for Decimal {
    fn from(percentage: Percentage) -> Self {
        percentage.value
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percent_points().normalize())
    }
}

fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}
