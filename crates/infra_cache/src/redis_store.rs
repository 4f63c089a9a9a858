//! Redis cache store
//!
//! Uses a `ConnectionManager`, which reconnects on its own after a dropped
//! connection. Prefix deletion walks the key space with `SCAN` rather than
//! `KEYS` so a large cache never blocks the server.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, PortError};

use crate::store::CacheStore;

const SCAN_BATCH: usize = 100;

/// Redis-backed cache store
#[derive(Clone)]
pub struct RedisCacheStore {
    connection: ConnectionManager,
}

impl RedisCacheStore {
    /// Connects to the Redis server at `url`
    pub async fn connect(url: &str) -> Result<Self, PortError> {
        let client = Client::open(url).map_err(to_port_error)?;
        let connection = ConnectionManager::new(client).await.map_err(to_port_error)?;
        info!("Connected to Redis cache");
        Ok(Self { connection })
    }
}

fn to_port_error(error: RedisError) -> PortError {
    let message = format!("Redis: {}", error);
    if error.is_connection_refusal() || error.is_connection_dropped() || error.is_io_error() || error.is_timeout() {
        PortError::connection(message).with_source(error)
    } else {
        PortError::internal(message).with_source(error)
    }
}

impl DomainPort for RedisCacheStore {}

#[async_trait]
impl HealthCheckable for RedisCacheStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let mut conn = self.connection.clone();
        let result: Result<String, RedisError> = redis::cmd("PING").query_async(&mut conn).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult::healthy("redis", latency_ms),
            Err(e) => HealthCheckResult::unhealthy("redis", latency_ms, e.to_string()),
        }
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, PortError> {
        let mut conn = self.connection.clone();
        conn.get(key).await.map_err(to_port_error)
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), PortError> {
        let mut conn = self.connection.clone();
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(to_port_error)
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<(), PortError> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(key).await.map_err(to_port_error)
    }

    #[instrument(skip(self))]
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, PortError> {
        let mut conn = self.connection.clone();
        let pattern = format!("{}*", prefix);
        let mut cursor: u64 = 0;
        let mut deleted = 0u64;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(to_port_error)?;

            if !keys.is_empty() {
                let removed: u64 = conn.del(&keys).await.map_err(to_port_error)?;
                deleted += removed;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!(prefix = %prefix, deleted, "Deleted cache keys by prefix");
        Ok(deleted)
    }
}
