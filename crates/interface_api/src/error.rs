//! API error handling
//!
//! Validation failures name the offending field. Persistence failures are
//! logged with their source and answered with a generic message.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use validator::{ValidationErrors, ValidationErrorsKind};

use core_kernel::CoreError;
use domain_rating::RatingError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Calculation failed: {0}")]
    Calculation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal,
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, field) = match &self {
            ApiError::Validation { field, .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", Some(field.clone()))
            }
            ApiError::Calculation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "calculation_error", None),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", None),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", None),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict", None),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
            field,
        };

        (status, Json(body)).into_response()
    }
}

impl From<RatingError> for ApiError {
    fn from(err: RatingError) -> Self {
        match err {
            RatingError::Validation(CoreError::Validation { field, message }) => {
                ApiError::Validation { field, message }
            }
            RatingError::Validation(other) => ApiError::Validation {
                field: "input".to_string(),
                message: other.to_string(),
            },
            RatingError::Calculation(message) => ApiError::Calculation(message),
            RatingError::NotFound(id) => ApiError::NotFound(format!("Calculation {} not found", id)),
            RatingError::Duplicate(id) => ApiError::Conflict(format!("Calculation {} already exists", id)),
            RatingError::Persistence(source) => {
                error!(error = %source, "Persistence failure");
                ApiError::Internal
            }
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let (field, message) = first_violation(&errors, "")
            .unwrap_or_else(|| ("input".to_string(), "is invalid".to_string()));
        ApiError::Validation { field, message }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Picks the alphabetically first failing field, descending into nested structs
fn first_violation(errors: &ValidationErrors, prefix: &str) -> Option<(String, String)> {
    let mut entries: Vec<_> = errors.errors().iter().collect();
    entries.sort_by_key(|(name, _)| name.to_string());

    for (name, kind) in entries {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", prefix, name)
        };
        let found = match kind {
            ValidationErrorsKind::Field(violations) => violations.first().map(|violation| {
                let message = violation
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("failed the {} check", violation.code));
                (path.clone(), message)
            }),
            ValidationErrorsKind::Struct(nested) => first_violation(nested, &path),
            ValidationErrorsKind::List(items) => items
                .iter()
                .find_map(|(index, nested)| first_violation(nested, &format!("{}[{}]", path, index))),
        };
        if found.is_some() {
            return found;
        }
    }
    None
}
