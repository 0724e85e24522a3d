//! Circuit breaker for backend calls
//!
//! Opens after `failure_threshold` consecutive transient failures. While
//! open, calls fail fast until `reset_timeout_secs` have passed; then a
//! single trial call at a time is let through (half-open). Its outcome
//! releases the slot. `success_threshold` successes close the breaker.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::warn;

use core_kernel::CircuitBreakerConfig;

#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    failure_count: AtomicU64,
    success_count: AtomicU64,
    is_open: AtomicBool,
    /// Set while a half-open trial call is in flight
    trial_in_flight: AtomicBool,
    opened_at: RwLock<Option<Instant>>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            failure_count: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            is_open: AtomicBool::new(false),
            trial_in_flight: AtomicBool::new(false),
            opened_at: RwLock::new(None),
        }
    }

    /// Returns true if a call could be attempted now, without claiming it
    pub async fn is_available(&self) -> bool {
        if !self.is_open.load(Ordering::Acquire) {
            return true;
        }
        self.reset_timeout_elapsed().await && !self.trial_in_flight.load(Ordering::Acquire)
    }

    /// Claims permission for one call
    ///
    /// Always granted while closed. While open, granted to exactly one caller
    /// once the reset timeout has passed; that caller must report back through
    /// [`record_success`](Self::record_success) or
    /// [`record_failure`](Self::record_failure).
    pub async fn try_acquire(&self) -> bool {
        if !self.is_open.load(Ordering::Acquire) {
            return true;
        }
        if !self.reset_timeout_elapsed().await {
            return false;
        }
        !self.trial_in_flight.swap(true, Ordering::AcqRel)
    }

    async fn reset_timeout_elapsed(&self) -> bool {
        match *self.opened_at.read().await {
            Some(at) => at.elapsed() >= Duration::from_secs(self.config.reset_timeout_secs),
            None => true,
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open.load(Ordering::Relaxed)
    }

    pub fn record_success(&self) {
        self.failure_count.store(0, Ordering::Relaxed);
        if self.is_open.load(Ordering::Acquire) {
            let successes = self.success_count.fetch_add(1, Ordering::Relaxed) + 1;
            if successes >= u64::from(self.config.success_threshold) {
                self.is_open.store(false, Ordering::Release);
                self.success_count.store(0, Ordering::Relaxed);
            }
        }
        self.trial_in_flight.store(false, Ordering::Release);
    }

    pub async fn record_failure(&self) {
        self.success_count.store(0, Ordering::Relaxed);
        let failures = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= u64::from(self.config.failure_threshold) {
            *self.opened_at.write().await = Some(Instant::now());
            if !self.is_open.swap(true, Ordering::AcqRel) {
                warn!(failures, "Backend circuit breaker opened");
            }
        }
        self.trial_in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(reset_timeout_secs: u64) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 2,
            success_threshold: 1,
            reset_timeout_secs,
        })
    }

    #[tokio::test]
    async fn test_opens_after_threshold() {
        let cb = breaker(60);
        cb.record_failure().await;
        assert!(cb.is_available().await);
        cb.record_failure().await;
        assert!(cb.is_open());
        assert!(!cb.is_available().await);
    }

    #[tokio::test]
    async fn test_half_open_trial_closes_on_success() {
        let cb = breaker(0);
        cb.record_failure().await;
        cb.record_failure().await;
        assert!(cb.try_acquire().await);

        cb.record_success();
        assert!(!cb.is_open());
    }

    #[tokio::test]
    async fn test_half_open_admits_one_caller_at_a_time() {
        let cb = breaker(0);
        cb.record_failure().await;
        cb.record_failure().await;

        assert!(cb.is_available().await);
        assert!(cb.try_acquire().await);
        assert!(!cb.try_acquire().await);
        assert!(!cb.try_acquire().await);
        assert!(!cb.is_available().await);

        // a failed trial re-opens and frees the slot for the next one
        cb.record_failure().await;
        assert!(cb.is_open());
        assert!(cb.try_acquire().await);
        assert!(!cb.try_acquire().await);
    }

    #[tokio::test]
    async fn test_closed_breaker_admits_everyone() {
        let cb = breaker(60);
        assert!(cb.try_acquire().await);
        assert!(cb.try_acquire().await);
    }

    #[tokio::test]
    async fn test_success_resets_failure_count() {
        let cb = breaker(60);
        cb.record_failure().await;
        cb.record_success();
        cb.record_failure().await;
        assert!(!cb.is_open());
    }
}
