//! Core Kernel - Foundational types for the premium calculation service
//!
//! This crate provides the building blocks shared by every other crate:
//! - Money and Percentage types with precise, rounded decimal arithmetic
//! - The calculation identifier
//! - Core and port error types plus health-check abstractions

pub mod money;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use money::{Money, Percentage, MoneyError, CURRENCY_CODE, CURRENCY_SYMBOL};
pub use identifiers::CalculationId;
pub use error::CoreError;
pub use ports::{PortError, DomainPort, AdapterHealth, HealthCheckResult, HealthCheckable};
