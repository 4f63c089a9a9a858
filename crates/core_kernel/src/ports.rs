//! Ports and Adapters Infrastructure
//!
//! Foundational types for the hexagonal architecture used by the calculation
//! service. Port traits (the calculation repository, the cache store) are
//! defined next to the code that consumes them and extend the marker traits
//! here; adapters (PostgreSQL, Redis, in-memory) implement them.
//!
//! ```text
//!        CalculationService (use cases)
//!                  │
//!                  ▼
//!        CalculationRepository port
//!           ▲                ▲
//!           │                │
//!  CachedCalculationRepository ──► CacheStore port ◄── Redis / in-memory
//!           │
//!  PostgresCalculationRepository
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

type BoxedSource = Box<dyn StdError + Send + Sync>;

/// Failure reported by a storage or cache adapter
#[derive(Debug, Error)]
pub enum PortError {
    #[error("Not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    /// A write collided with stored data, e.g. a reused id
    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Service unavailable: {service}")]
    Unavailable { service: String },

    /// Stored data could not be decoded back into domain types
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl PortError {
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict { message: message.into() }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    pub fn unavailable(service: impl Into<String>) -> Self {
        PortError::Unavailable { service: service.into() }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        PortError::Serialization { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the underlying error; only `Connection` and `Internal` keep one
    pub fn with_source(mut self, error: impl StdError + Send + Sync + 'static) -> Self {
        if let PortError::Connection { source, .. } | PortError::Internal { source, .. } = &mut self {
            *source = Some(Box::new(error));
        }
        self
    }

    /// Connection and availability failures may succeed when retried
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::Connection { .. } | PortError::Unavailable { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, PortError::Conflict { .. })
    }
}

/// Marker for port traits; implementations must be shareable across tasks
pub trait DomainPort: Send + Sync + 'static {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    Unhealthy,
}

/// Outcome of probing one adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Adapter name, e.g. `postgres` or `redis`
    pub component: String,
    pub status: AdapterHealth,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl HealthCheckResult {
    pub fn healthy(component: impl Into<String>, latency_ms: u64) -> Self {
        Self::with_status(component.into(), AdapterHealth::Healthy, latency_ms, None)
    }

    pub fn unhealthy(component: impl Into<String>, latency_ms: u64, message: impl Into<String>) -> Self {
        Self::with_status(component.into(), AdapterHealth::Unhealthy, latency_ms, Some(message.into()))
    }

    fn with_status(component: String, status: AdapterHealth, latency_ms: u64, message: Option<String>) -> Self {
        Self {
            component,
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == AdapterHealth::Healthy
    }
}

/// Adapters that can probe their backing service
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    async fn health_check(&self) -> HealthCheckResult;
}
