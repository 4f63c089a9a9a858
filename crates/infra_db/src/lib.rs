//! Infrastructure Database Layer
//!
//! This crate provides PostgreSQL storage for premium calculations using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: `PostgresCalculationRepository`
//! implements the `CalculationRepository` port from `domain_rating`, hiding the
//! SQL and the row mapping from the domain layer.
//!
//! # Schema
//!
//! Two tables in a 1:1 relationship with cascade delete:
//! - `insurance_calculations`: vehicle data, computed results, timestamps
//!   and the `deleted_at` soft-delete marker
//! - `calculation_addresses`: the optional registration address
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresCalculationRepository};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/calculations")).await?;
//! run_migrations(&pool).await?;
//! let repository = PostgresCalculationRepository::new(pool);
//! ```

pub mod error;
pub mod pool;
pub mod repositories;

pub use error::DatabaseError;
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
pub use repositories::{CalculationRow, PostgresCalculationRepository};
