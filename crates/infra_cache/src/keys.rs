//! Cache key layout
//!
//! ```text
//! {prefix}calculation:{id}                      single calculation
//! {prefix}calculations:list:{offset}:{limit}    one page of active calculations
//! ```

use core_kernel::CalculationId;
use domain_rating::PageRequest;

/// Prefix used when none is configured
pub const DEFAULT_KEY_PREFIX: &str = "insurance:";

/// Builds cache keys under a common prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    prefix: String,
}

impl CacheKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key of a single calculation
    pub fn item(&self, id: CalculationId) -> String {
        format!("{}calculation:{}", self.prefix, id)
    }

    /// Key of one page of the active list
    pub fn page(&self, page: PageRequest) -> String {
        format!("{}{}:{}", self.list_prefix(), page.offset(), page.limit())
    }

    /// Common prefix of every page key
    pub fn list_prefix(&self) -> String {
        format!("{}calculations:list:", self.prefix)
    }
}

impl Default for CacheKeys {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}
