//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! premium calculation test suite.
//!
//! # Modules
//!
//! - `fixtures`: Reference scenario inputs, addresses and rating parameters
//! - `builders`: Builder patterns for inputs and calculated aggregates
//! - `database`: PostgreSQL testcontainer management
//! - `assertions`: Custom assertion helpers for calculations
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
