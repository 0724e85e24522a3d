//! Core Kernel - Foundational types for the commission desk
//!
//! This crate provides the building blocks shared by every other crate:
//! - Money types with precise decimal arithmetic
//! - Timezone-aware calendar helpers (local days, Sunday-to-Saturday weeks)
//! - Opaque backend identifiers
//! - Port infrastructure for adapters to external systems

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;
pub mod error;

pub use money::{Money, Currency, MoneyError};
pub use temporal::{DateRange, Timezone, TemporalError};
pub use identifiers::{CommissionId, AgentId, MemberId, IdentifierError};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
    CircuitBreakerConfig, OperationMetadata,
};
pub use error::CoreError;
