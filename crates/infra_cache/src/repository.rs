//! Cache-aside calculation repository
//!
//! Reads try the cache first and populate it on a miss. Every mutation is
//! written to the wrapped repository before the affected keys are
//! invalidated; entries are never updated in place. Invalidation removes the
//! item key and every page key, since any page may contain the calculation.
//!
//! A failing cache is logged at `warn` and otherwise ignored.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use core_kernel::{CalculationId, DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_rating::{CalculationAggregate, CalculationRepository, PageRequest, SoftDeleteOutcome};

use crate::keys::CacheKeys;
use crate::store::CacheStore;

/// Entry lifetime used when none is configured
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Tuning for the cache-aside layer
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub ttl: Duration,
    pub keys: CacheKeys,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CACHE_TTL,
            keys: CacheKeys::default(),
        }
    }
}

/// Wraps a repository with a read cache
#[derive(Clone)]
pub struct CachedCalculationRepository {
    inner: Arc<dyn CalculationRepository>,
    cache: Arc<dyn CacheStore>,
    settings: CacheSettings,
}

impl CachedCalculationRepository {
    pub fn new(
        inner: Arc<dyn CalculationRepository>,
        cache: Arc<dyn CacheStore>,
        settings: CacheSettings,
    ) -> Self {
        Self { inner, cache, settings }
    }

    /// Health of the cache store alone
    pub async fn cache_health(&self) -> HealthCheckResult {
        self.cache.health_check().await
    }

    async fn cached<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.cache.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %key, "Cache miss");
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed, using repository");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key = %key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding unreadable cache entry");
                if let Err(e) = self.cache.delete(key).await {
                    warn!(key = %key, error = %e, "Cache delete failed");
                }
                None
            }
        }
    }

    async fn populate<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "Could not serialize cache entry");
                return;
            }
        };
        if let Err(e) = self.cache.set(key, raw, self.settings.ttl).await {
            warn!(key = %key, error = %e, "Cache write failed");
        }
    }

    async fn invalidate(&self, id: CalculationId) {
        let item = self.settings.keys.item(id);
        if let Err(e) = self.cache.delete(&item).await {
            warn!(key = %item, error = %e, "Cache invalidation failed");
        }

        let pages = self.settings.keys.list_prefix();
        match self.cache.delete_prefix(&pages).await {
            Ok(deleted) => debug!(calculation_id = %id, pages = deleted, "Invalidated cached calculation"),
            Err(e) => warn!(prefix = %pages, error = %e, "Cache list invalidation failed"),
        }
    }
}

impl DomainPort for CachedCalculationRepository {}

#[async_trait]
impl HealthCheckable for CachedCalculationRepository {
    async fn health_check(&self) -> HealthCheckResult {
        self.inner.health_check().await
    }
}

#[async_trait]
impl CalculationRepository for CachedCalculationRepository {
    #[instrument(skip(self, aggregate), fields(calculation_id = %aggregate.id()))]
    async fn save(&self, aggregate: &CalculationAggregate) -> Result<(), PortError> {
        self.inner.save(aggregate).await?;
        self.invalidate(aggregate.id()).await;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: CalculationId) -> Result<Option<CalculationAggregate>, PortError> {
        let key = self.settings.keys.item(id);
        if let Some(aggregate) = self.cached::<CalculationAggregate>(&key).await {
            return Ok(Some(aggregate));
        }

        let found = self.inner.find_by_id(id).await?;
        if let Some(aggregate) = &found {
            self.populate(&key, aggregate).await;
        }
        Ok(found)
    }

    #[instrument(skip(self))]
    async fn list_active(&self, page: PageRequest) -> Result<Vec<CalculationAggregate>, PortError> {
        let key = self.settings.keys.page(page);
        if let Some(calculations) = self.cached::<Vec<CalculationAggregate>>(&key).await {
            return Ok(calculations);
        }

        let calculations = self.inner.list_active(page).await?;
        self.populate(&key, calculations.as_slice()).await;
        Ok(calculations)
    }

    #[instrument(skip(self, aggregate), fields(calculation_id = %aggregate.id()))]
    async fn update(&self, aggregate: &CalculationAggregate) -> Result<(), PortError> {
        self.inner.update(aggregate).await?;
        self.invalidate(aggregate.id()).await;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn soft_delete(&self, id: CalculationId, at: DateTime<Utc>) -> Result<SoftDeleteOutcome, PortError> {
        let outcome = self.inner.soft_delete(id, at).await?;
        if outcome.is_success() {
            self.invalidate(id).await;
        }
        Ok(outcome)
    }

    #[instrument(skip(self))]
    async fn purge(&self, id: CalculationId) -> Result<bool, PortError> {
        let removed = self.inner.purge(id).await?;
        if removed {
            self.invalidate(id).await;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCacheStore;
    use domain_rating::InMemoryCalculationRepository;
    use test_utils::CalculationAggregateBuilder;

    fn layered() -> (InMemoryCalculationRepository, InMemoryCacheStore, CachedCalculationRepository) {
        let repository = InMemoryCalculationRepository::new();
        let cache = InMemoryCacheStore::default();
        let cached = CachedCalculationRepository::new(
            Arc::new(repository.clone()),
            Arc::new(cache.clone()),
            CacheSettings::default(),
        );
        (repository, cache, cached)
    }

    #[tokio::test]
    async fn test_miss_populates_item_key() {
        let (repository, cache, cached) = layered();
        let aggregate = CalculationAggregateBuilder::new().build();
        repository.save(&aggregate).await.unwrap();

        cached.find_by_id(aggregate.id()).await.unwrap();

        let key = CacheKeys::default().item(aggregate.id());
        assert!(cache.get(&key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_cached() {
        let (_repository, cache, cached) = layered();
        assert!(cached.find_by_id(CalculationId::new()).await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_entry_is_discarded() {
        let (repository, cache, cached) = layered();
        let aggregate = CalculationAggregateBuilder::new().build();
        repository.save(&aggregate).await.unwrap();
        let key = CacheKeys::default().item(aggregate.id());
        cache.set(&key, "not json".to_string(), DEFAULT_CACHE_TTL).await.unwrap();

        let found = cached.find_by_id(aggregate.id()).await.unwrap();

        assert_eq!(found, Some(aggregate));
        assert_eq!(repository.read_count(), 1);
    }
}
