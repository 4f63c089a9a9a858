//! Repository implementations
//!
//! Repositories encapsulate SQL queries, run multi-table writes in one
//! transaction, and map between database rows and domain types.

pub mod calculation;

pub use calculation::{CalculationRow, PostgresCalculationRepository};
