//! HTTP API Layer
//!
//! A thin axum wrapper over the calculation use cases.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for calculations and health probes
//! - **Middleware**: Request logging
//! - **DTOs**: Request/Response data transfer objects with shape validation
//! - **Error Handling**: Consistent error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(AppState::new(service, database, cache));
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;

use axum::{
    middleware as axum_middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use core_kernel::HealthCheckable;
use domain_rating::CalculationService;
use infra_cache::CacheStore;

use crate::handlers::{calculations, health};
use crate::middleware::request_logging;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub calculations: CalculationService,
    /// Storage probed by the readiness check
    pub database: Arc<dyn HealthCheckable>,
    /// Cache probed by the readiness check, when caching is enabled
    pub cache: Option<Arc<dyn CacheStore>>,
}

impl AppState {
    pub fn new(
        calculations: CalculationService,
        database: Arc<dyn HealthCheckable>,
        cache: Option<Arc<dyn CacheStore>>,
    ) -> Self {
        Self {
            calculations,
            database,
            cache,
        }
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let calculation_routes = Router::new()
        .route(
            "/",
            get(calculations::list_calculations).post(calculations::create_calculation),
        )
        .route(
            "/:id",
            get(calculations::get_calculation)
                .put(calculations::update_calculation)
                .delete(calculations::delete_calculation),
        );

    let api_routes = Router::new()
        .nest("/calculations", calculation_routes)
        .layer(axum_middleware::from_fn(request_logging));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}
