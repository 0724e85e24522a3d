//! Infrastructure Layer - Commissions backend over HTTP
//!
//! This crate provides the production implementation of
//! `domain_commission::CommissionPort`:
//! - `reqwest` client with retry and exponential backoff
//! - Circuit breaker shared across calls
//! - Backend status to `PortError` mapping

pub mod adapter;
pub mod circuit_breaker;
pub mod client;
pub mod config;

pub use adapter::HttpCommissionAdapter;
pub use circuit_breaker::CircuitBreaker;
pub use client::{HttpClient, HttpClientBuilder, RetryPolicy};
pub use config::BackendConfig;
