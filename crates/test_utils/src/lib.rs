//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! commission desk test suite.
//!
//! # Modules
//!
//! - `fixtures`: Reference clock and one commission per payout state
//! - `builders`: Builder for commission records and backend payloads
//! - `assertions`: Custom assertion helpers for buckets and totals
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
