//! In-memory cache store
//!
//! A `DashMap` of entries with an expiry instant and a recency stamp.
//! When the stored bytes would exceed the memory cap, the least recently
//! used entries are evicted first. Expired entries are dropped lazily on read.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, PortError};

use crate::store::CacheStore;

/// Memory cap used by `InMemoryCacheStore::default`
pub const DEFAULT_MAX_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
    last_used: u64,
}

impl Entry {
    fn size(key: &str, value: &str) -> usize {
        key.len() + value.len()
    }
}

/// Process-local LRU cache with time-to-live
#[derive(Debug, Clone)]
pub struct InMemoryCacheStore {
    entries: Arc<DashMap<String, Entry>>,
    used_bytes: Arc<AtomicUsize>,
    clock: Arc<AtomicU64>,
    max_bytes: usize,
    unavailable: Arc<AtomicBool>,
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BYTES)
    }
}

impl InMemoryCacheStore {
    /// Creates a store holding at most `max_bytes` of keys plus values
    pub fn new(max_bytes: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            used_bytes: Arc::new(AtomicUsize::new(0)),
            clock: Arc::new(AtomicU64::new(0)),
            max_bytes,
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes currently accounted against the memory cap
    pub fn used_bytes(&self) -> usize {
        self.used_bytes.load(Ordering::SeqCst)
    }

    /// Makes every following call fail as if the store were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), PortError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PortError::unavailable("in-memory cache"));
        }
        Ok(())
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::SeqCst)
    }

    fn remove_key(&self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some((key, entry)) => {
                self.used_bytes
                    .fetch_sub(Entry::size(&key, &entry.value), Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// Removes `key` only if the stored entry is still expired at `now`
    fn remove_expired(&self, key: &str, now: Instant) -> bool {
        match self.entries.remove_if(key, |_, entry| entry.expires_at <= now) {
            Some((key, entry)) => {
                self.used_bytes
                    .fetch_sub(Entry::size(&key, &entry.value), Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    fn evict_for(&self, incoming: usize) {
        while self.used_bytes() + incoming > self.max_bytes {
            let victim = self
                .entries
                .iter()
                .min_by_key(|entry| entry.last_used)
                .map(|entry| entry.key().clone());
            match victim {
                Some(key) => {
                    debug!(key = %key, "Evicting least recently used cache entry");
                    self.remove_key(&key);
                }
                None => break,
            }
        }
    }
}

impl DomainPort for InMemoryCacheStore {}

#[async_trait]
impl HealthCheckable for InMemoryCacheStore {
    async fn health_check(&self) -> HealthCheckResult {
        match self.check_available() {
            Ok(()) => HealthCheckResult::healthy("in-memory-cache", 0),
            Err(e) => HealthCheckResult::unhealthy("in-memory-cache", 0, e.to_string()),
        }
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PortError> {
        self.check_available()?;
        let now = Instant::now();
        let stamp = self.tick();

        if let Some(mut entry) = self.entries.get_mut(key) {
            if entry.expires_at > now {
                entry.last_used = stamp;
                return Ok(Some(entry.value.clone()));
            }
        } else {
            return Ok(None);
        }

        self.remove_expired(key, now);
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), PortError> {
        self.check_available()?;
        let size = Entry::size(key, &value);
        if size > self.max_bytes {
            debug!(key = %key, size, "Value larger than the cache, not stored");
            return Ok(());
        }

        self.remove_key(key);
        self.evict_for(size);

        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
            last_used: self.tick(),
        };
        self.used_bytes.fetch_add(size, Ordering::SeqCst);
        if let Some(previous) = self.entries.insert(key.to_string(), entry) {
            self.used_bytes
                .fetch_sub(Entry::size(key, &previous.value), Ordering::SeqCst);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), PortError> {
        self.check_available()?;
        self.remove_key(key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, PortError> {
        self.check_available()?;
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();

        let mut deleted = 0u64;
        for key in keys {
            if self.remove_key(&key) {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}
