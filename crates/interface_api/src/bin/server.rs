//! Premium Calculator - API Server Binary
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin premium-api
//!
//! # Run with environment variables
//! API_PORT=8080 API_DATABASE_URL=postgres://... API_REDIS_URL=redis://... cargo run --bin premium-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST`, `API_PORT` - Bind address (default: 0.0.0.0:8080)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_REDIS_URL` - Redis connection string; in-memory cache when unset
//! * `API_CACHE_ENABLED`, `API_CACHE_TTL_SECS`, `API_CACHE_KEY_PREFIX` - Cache tuning
//! * `API_LOG_LEVEL` - Log level (default: info); `RUST_LOG` takes precedence
//! * `API_LOG_FORMAT` - `pretty` or `json`
//! * `API_RATING_CONFIG_PATH` - Rating parameter file; falls back to `CONFIG_PATH`
//!
//! Rating parameters may also be overridden with their own variables
//! (`BASE_RATE`, `GIS_ADJUSTMENT_RATE`, ...).

use anyhow::Context;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_rating::{CalculationRepository, CalculationService, RatingConfig};
use infra_cache::{
    CacheKeys, CacheSettings, CacheStore, CachedCalculationRepository, InMemoryCacheStore, RedisCacheStore,
};
use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresCalculationRepository};
use interface_api::config::{LogFormat, ServiceSettings};
use interface_api::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let settings = ServiceSettings::from_env().context("invalid service settings")?;
    init_tracing(&settings.log_level, settings.log_format);

    info!(host = %settings.host, port = settings.port, "Starting premium calculator API");

    let rating = Arc::new(load_rating_config(&settings)?);

    let pool = create_pool(
        DatabaseConfig::new(settings.database_url.clone())
            .with_pool_size(settings.database_min_connections, settings.database_max_connections),
    )
    .await
    .context("database connection failed")?;
    run_migrations(&pool).await.context("database migrations failed")?;

    let postgres = Arc::new(PostgresCalculationRepository::new(pool));
    let cache = build_cache(&settings).await;

    let repository: Arc<dyn CalculationRepository> = match &cache {
        Some(cache) => Arc::new(CachedCalculationRepository::new(
            postgres.clone(),
            cache.clone(),
            CacheSettings {
                ttl: settings.cache_ttl(),
                keys: CacheKeys::new(settings.cache_key_prefix.clone()),
            },
        )),
        None => postgres.clone(),
    };

    let service = CalculationService::new(repository, rating);
    let app = create_router(AppState::new(service, postgres, cache));

    let addr: SocketAddr = settings.server_addr().parse().context("invalid bind address")?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber; `RUST_LOG` overrides the configured level
fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().with_target(true)).init(),
    }
}

/// Loads rating parameters; any failure stops startup
fn load_rating_config(settings: &ServiceSettings) -> anyhow::Result<RatingConfig> {
    let config = match &settings.rating_config_path {
        Some(path) => RatingConfig::from_file(Path::new(path)),
        None => RatingConfig::from_environment(),
    }
    .context("invalid rating parameters")?;

    info!(
        base_rate = %config.base_rate(),
        coverage = %config.coverage_percentage(),
        "Rating parameters loaded"
    );
    Ok(config)
}

/// Connects the cache store; Redis when configured, otherwise in-memory
async fn build_cache(settings: &ServiceSettings) -> Option<Arc<dyn CacheStore>> {
    if !settings.cache_enabled {
        info!("Cache disabled");
        return None;
    }

    match &settings.redis_url {
        Some(url) => match RedisCacheStore::connect(url).await {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                warn!(error = %e, "Redis unavailable, using in-memory cache");
                Some(Arc::new(InMemoryCacheStore::default()))
            }
        },
        None => {
            info!("No Redis URL configured, using in-memory cache");
            Some(Arc::new(InMemoryCacheStore::default()))
        }
    }
}

/// Waits for Ctrl+C or SIGTERM so in-flight requests can finish
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
