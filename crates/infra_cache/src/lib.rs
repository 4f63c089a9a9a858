//! Infrastructure Cache Crate
//!
//! Read cache for premium calculations. Provides:
//!
//! - The `CacheStore` port with Redis and in-memory (LRU, TTL) adapters
//! - `CacheKeys` for the item and list key layout
//! - `CachedCalculationRepository`, a cache-aside decorator over any
//!   `CalculationRepository`
//!
//! Cache failures never reach callers: reads fall back to the wrapped
//! repository and writes skip invalidation with a warning.

pub mod keys;
pub mod store;
pub mod memory;
pub mod redis_store;
pub mod repository;

pub use keys::{CacheKeys, DEFAULT_KEY_PREFIX};
pub use store::CacheStore;
pub use memory::{InMemoryCacheStore, DEFAULT_MAX_BYTES};
pub use redis_store::RedisCacheStore;
pub use repository::{CacheSettings, CachedCalculationRepository, DEFAULT_CACHE_TTL};
