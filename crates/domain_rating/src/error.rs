//! Rating domain errors
//!
//! This module defines the error taxonomy surfaced by the calculation use
//! cases. Cache failures never appear here: the cache-aside layer absorbs
//! them and degrades to the repository.

use thiserror::Error;

use core_kernel::{CalculationId, CoreError, PortError};

/// Errors that can occur in the rating domain
#[derive(Debug, Error)]
pub enum RatingError {
    /// Malformed input to a value object, rejected before any computation
    #[error(transparent)]
    Validation(#[from] CoreError),

    /// A formula produced a value that violates a hard domain rule
    #[error("Calculation error: {0}")]
    Calculation(String),

    /// Unknown or soft-deleted calculation
    #[error("Calculation {0} not found")]
    NotFound(CalculationId),

    /// A create was retried with an id that is already stored
    #[error("Calculation {0} already exists")]
    Duplicate(CalculationId),

    /// Backing-store failure; the message stays generic on purpose
    #[error("Persistence failure")]
    Persistence(#[source] PortError),
}

impl RatingError {
    /// Creates a validation error for a named field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        RatingError::Validation(CoreError::validation(field, message))
    }

    /// Creates a calculation error
    pub fn calculation(message: impl Into<String>) -> Self {
        RatingError::Calculation(message.into())
    }

    /// Translates a repository error for the given calculation id
    pub fn from_port(id: CalculationId, error: PortError) -> Self {
        match error {
            PortError::NotFound { .. } => RatingError::NotFound(id),
            PortError::Conflict { .. } => RatingError::Duplicate(id),
            other => RatingError::Persistence(other),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RatingError::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, RatingError::Validation(_))
    }
}

impl From<PortError> for RatingError {
    fn from(error: PortError) -> Self {
        RatingError::Persistence(error)
    }
}
