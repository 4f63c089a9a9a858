//! Calculation handlers

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use core_kernel::CalculationId;
use domain_rating::PageRequest;

use crate::dto::calculation::{CalculationRequest, CalculationResponse, PageQuery};
use crate::{error::ApiError, AppState};

fn validated(body: Result<Json<CalculationRequest>, JsonRejection>) -> Result<CalculationRequest, ApiError> {
    let Json(request) = body?;
    request.validate()?;
    Ok(request)
}

/// Calculates and stores a premium
pub async fn create_calculation(
    State(state): State<AppState>,
    body: Result<Json<CalculationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CalculationResponse>), ApiError> {
    let request = validated(body)?;
    let calculation = state.calculations.create_calculation(request.into()).await?;
    info!(calculation_id = %calculation.id(), "Calculation request served");
    Ok((StatusCode::CREATED, Json(CalculationResponse::from(&calculation))))
}

/// Lists active calculations, newest first
pub async fn list_calculations(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Vec<CalculationResponse>>, ApiError> {
    let Query(query) = query?;
    let page = PageRequest::new(query.offset_or_default(), query.limit_or_default())
        .map_err(domain_rating::RatingError::from)?;
    let calculations = state.calculations.list_calculations(page).await?;
    Ok(Json(calculations.iter().map(CalculationResponse::from).collect()))
}

/// Gets a calculation by ID
pub async fn get_calculation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CalculationResponse>, ApiError> {
    let calculation = state.calculations.get_calculation(CalculationId::from_uuid(id)).await?;
    Ok(Json(CalculationResponse::from(&calculation)))
}

/// Recalculates a calculation from new inputs
pub async fn update_calculation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<CalculationRequest>, JsonRejection>,
) -> Result<Json<CalculationResponse>, ApiError> {
    let request = validated(body)?;
    let calculation = state
        .calculations
        .update_calculation(CalculationId::from_uuid(id), request.into())
        .await?;
    Ok(Json(CalculationResponse::from(&calculation)))
}

/// Soft-deletes a calculation
pub async fn delete_calculation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.calculations.delete_calculation(CalculationId::from_uuid(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
