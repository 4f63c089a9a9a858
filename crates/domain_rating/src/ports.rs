//! Rating Domain Ports
//!
//! This module defines the storage port for calculations. Adapters:
//!
//! - **PostgreSQL Adapter**: transactional storage (infra_db)
//! - **Cache-Aside Decorator**: wraps any repository with a read cache (infra_cache)
//! - **In-Memory Adapter**: for tests, behind the `mock` feature
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_rating::ports::CalculationRepository;
//! use std::sync::Arc;
//!
//! let repository: Arc<dyn CalculationRepository> = Arc::new(PostgresCalculationRepository::new(pool));
//! let service = CalculationService::new(repository, config);
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{CalculationId, CoreError, DomainPort, HealthCheckable, PortError};

use crate::aggregate::CalculationAggregate;

/// Page size used when the caller does not provide one
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Largest page a caller may request
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Offset/limit pagination for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    offset: u32,
    limit: u32,
}

impl PageRequest {
    /// Creates a page request; `limit` must lie in `1..=100`
    pub fn new(offset: u32, limit: u32) -> Result<Self, CoreError> {
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(CoreError::validation(
                "limit",
                format!("must be between 1 and {}", MAX_PAGE_LIMIT),
            ));
        }
        Ok(Self { offset, limit })
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// What a soft delete found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftDeleteOutcome {
    /// The marker was set by this call
    Deleted,
    /// The marker was already set; nothing changed
    AlreadyDeleted,
    /// No row with that id exists
    NotFound,
}

impl SoftDeleteOutcome {
    /// True when the calculation is deleted after the call
    pub fn is_success(&self) -> bool {
        !matches!(self, SoftDeleteOutcome::NotFound)
    }
}

/// Transactional storage of calculation aggregates
///
/// Every write covers the calculation and its optional address as one atomic
/// unit. Reads never return soft-deleted calculations.
#[async_trait]
pub trait CalculationRepository: DomainPort + HealthCheckable {
    /// Stores a new calculation
    ///
    /// Returns `PortError::Conflict` if the id is already stored.
    async fn save(&self, aggregate: &CalculationAggregate) -> Result<(), PortError>;

    /// Retrieves an active calculation; `None` when unknown or soft-deleted
    async fn find_by_id(&self, id: CalculationId) -> Result<Option<CalculationAggregate>, PortError>;

    /// Lists active calculations, newest first
    async fn list_active(&self, page: PageRequest) -> Result<Vec<CalculationAggregate>, PortError>;

    /// Replaces an active calculation and its address row
    ///
    /// Returns `PortError::NotFound` if the id is unknown or soft-deleted.
    /// The stored `created_at` is kept.
    async fn update(&self, aggregate: &CalculationAggregate) -> Result<(), PortError>;

    /// Sets the deletion marker; repeating the call is harmless
    async fn soft_delete(&self, id: CalculationId, at: DateTime<Utc>) -> Result<SoftDeleteOutcome, PortError>;

    /// Physically removes a calculation, deleted or not, with its address
    ///
    /// Returns false when nothing was removed.
    async fn purge(&self, id: CalculationId) -> Result<bool, PortError>;
}

/// In-memory implementation of CalculationRepository for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use core_kernel::HealthCheckResult;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory repository that counts reads and can simulate an outage
    #[derive(Debug, Default, Clone)]
    pub struct InMemoryCalculationRepository {
        calculations: Arc<RwLock<HashMap<CalculationId, CalculationAggregate>>>,
        reads: Arc<AtomicUsize>,
        unavailable: Arc<AtomicBool>,
    }

    impl InMemoryCalculationRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of `find_by_id` and `list_active` calls served so far
        pub fn read_count(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        /// Makes every following call fail with a connection error
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        /// Returns a stored calculation regardless of its deletion marker
        pub async fn raw(&self, id: CalculationId) -> Option<CalculationAggregate> {
            self.calculations.read().await.get(&id).cloned()
        }

        fn check_available(&self) -> Result<(), PortError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(PortError::connection("in-memory repository offline"));
            }
            Ok(())
        }
    }

    impl DomainPort for InMemoryCalculationRepository {}

    #[async_trait]
    impl HealthCheckable for InMemoryCalculationRepository {
        async fn health_check(&self) -> HealthCheckResult {
            match self.check_available() {
                Ok(()) => HealthCheckResult::healthy("in-memory-calculations", 0),
                Err(e) => HealthCheckResult::unhealthy("in-memory-calculations", 0, e.to_string()),
            }
        }
    }

    #[async_trait]
    impl CalculationRepository for InMemoryCalculationRepository {
        async fn save(&self, aggregate: &CalculationAggregate) -> Result<(), PortError> {
            self.check_available()?;
            let mut calculations = self.calculations.write().await;
            if calculations.contains_key(&aggregate.id()) {
                return Err(PortError::conflict(format!(
                    "Calculation {} already exists",
                    aggregate.id()
                )));
            }
            calculations.insert(aggregate.id(), aggregate.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: CalculationId) -> Result<Option<CalculationAggregate>, PortError> {
            self.check_available()?;
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .calculations
                .read()
                .await
                .get(&id)
                .filter(|c| !c.is_deleted())
                .cloned())
        }

        async fn list_active(&self, page: PageRequest) -> Result<Vec<CalculationAggregate>, PortError> {
            self.check_available()?;
            self.reads.fetch_add(1, Ordering::SeqCst);
            let calculations = self.calculations.read().await;
            let mut active: Vec<_> = calculations.values().filter(|c| !c.is_deleted()).cloned().collect();
            active.sort_by(|a, b| {
                b.created_at()
                    .cmp(&a.created_at())
                    .then_with(|| a.id().as_uuid().cmp(b.id().as_uuid()))
            });
            Ok(active
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .collect())
        }

        async fn update(&self, aggregate: &CalculationAggregate) -> Result<(), PortError> {
            self.check_available()?;
            let mut calculations = self.calculations.write().await;
            let created_at = match calculations.get(&aggregate.id()) {
                Some(existing) if !existing.is_deleted() => existing.created_at(),
                _ => return Err(PortError::not_found("Calculation", aggregate.id())),
            };
            calculations.insert(aggregate.id(), restore_with_created_at(aggregate.clone(), created_at));
            Ok(())
        }

        async fn soft_delete(&self, id: CalculationId, at: DateTime<Utc>) -> Result<SoftDeleteOutcome, PortError> {
            self.check_available()?;
            let mut calculations = self.calculations.write().await;
            Ok(match calculations.get_mut(&id) {
                None => SoftDeleteOutcome::NotFound,
                Some(existing) if existing.is_deleted() => SoftDeleteOutcome::AlreadyDeleted,
                Some(existing) => {
                    existing.mark_deleted(at);
                    SoftDeleteOutcome::Deleted
                }
            })
        }

        async fn purge(&self, id: CalculationId) -> Result<bool, PortError> {
            self.check_available()?;
            Ok(self.calculations.write().await.remove(&id).is_some())
        }
    }

    fn restore_with_created_at(aggregate: CalculationAggregate, created_at: DateTime<Utc>) -> CalculationAggregate {
        use crate::aggregate::CalculationRecord;
        CalculationAggregate::restore(CalculationRecord {
            id: aggregate.id(),
            car: aggregate.car().clone(),
            applied_rate: aggregate.applied_rate(),
            calculated_premium: aggregate.calculated_premium(),
            deductible_value: aggregate.deductible_value(),
            policy_limit: aggregate.policy_limit(),
            broker_fee: aggregate.broker_fee(),
            gis_adjustment: aggregate.gis_adjustment(),
            registration_address: aggregate.registration_address().cloned(),
            created_at,
            updated_at: aggregate.updated_at(),
            deleted_at: aggregate.deleted_at(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults() {
        let page = PageRequest::default();
        assert_eq!(page.offset(), 0);
        assert_eq!(page.limit(), DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn test_page_request_limit_bounds() {
        assert!(PageRequest::new(0, 0).is_err());
        assert!(PageRequest::new(0, 1).is_ok());
        assert!(PageRequest::new(5, 100).is_ok());
        assert_eq!(PageRequest::new(0, 101).unwrap_err().field(), Some("limit"));
    }

    #[test]
    fn test_soft_delete_outcome_success() {
        assert!(SoftDeleteOutcome::Deleted.is_success());
        assert!(SoftDeleteOutcome::AlreadyDeleted.is_success());
        assert!(!SoftDeleteOutcome::NotFound.is_success());
    }
}
