//! Cache store port

use async_trait::async_trait;
use std::time::Duration;

use core_kernel::{DomainPort, HealthCheckable, PortError};

/// String key/value store with per-entry time-to-live
///
/// Values are opaque strings; callers serialize before `set`.
#[async_trait]
pub trait CacheStore: DomainPort + HealthCheckable {
    /// Returns the live value for `key`, if any
    async fn get(&self, key: &str) -> Result<Option<String>, PortError>;

    /// Stores `value` under `key` for at most `ttl`
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), PortError>;

    /// Removes `key`; absent keys are not an error
    async fn delete(&self, key: &str) -> Result<(), PortError>;

    /// Removes every key starting with `prefix` and returns how many went
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, PortError>;
}
