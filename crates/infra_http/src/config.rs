//! Backend connection settings

use serde::Deserialize;
use std::time::Duration;

use core_kernel::CircuitBreakerConfig;

/// Configuration for the commissions backend adapter
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend API (e.g. "https://backend.example.com/api")
    pub base_url: String,

    /// Sent as a bearer token when set
    pub api_key: Option<String>,

    /// Per-attempt request timeout in seconds
    pub timeout_secs: u64,

    /// Total attempts for idempotent requests, first try included
    pub retry_attempts: u32,

    /// Delay before the first retry; doubles on each further retry
    pub base_backoff_ms: u64,

    pub circuit_breaker: Option<CircuitBreakerConfig>,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }

    /// Joins `path` onto the base URL with exactly one slash
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: None,
            timeout_secs: 30,
            retry_attempts: 3,
            base_backoff_ms: 200,
            circuit_breaker: Some(CircuitBreakerConfig {
                failure_threshold: 5,
                success_threshold: 1,
                reset_timeout_secs: 30,
            }),
        }
    }
}
