//! # Circuit Breaker Module
//!
//! This module implements the circuit breaker pattern for external provider
//! calls (barcode lookup, ingredient explanations), together with a bounded
//! retry loop using jittered exponential backoff.

use rand::Rng;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::RecoveryConfig;
use crate::errors::LookupError;

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    last_failure_time: Option<Instant>,
}

/// Circuit breaker for one external provider
///
/// # State Machine
///
/// - **Closed**: Normal operation, requests pass through
/// - **Open**: Failure threshold exceeded, requests fail fast
/// - **Half-Open**: Reset timeout elapsed, the next request is let through
///
/// # Configuration
///
/// Uses `RecoveryConfig` for:
/// - `circuit_breaker_threshold`: Failures before opening (default: 5)
/// - `circuit_breaker_reset_secs`: Time before attempting reset (default: 60s)
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    state: Mutex<BreakerState>,
    config: RecoveryConfig,
}

impl CircuitBreaker {
    /// Create a closed circuit breaker for the named provider
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safe_bite::circuit_breaker::CircuitBreaker;
    /// use safe_bite::config::RecoveryConfig;
    ///
    /// let breaker = CircuitBreaker::new("open-food-facts", RecoveryConfig::default());
    /// assert!(!breaker.is_open());
    /// ```
    pub fn new(name: impl Into<String>, config: RecoveryConfig) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(BreakerState::default()),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if the circuit is open (blocking requests)
    ///
    /// Resets to closed once the reset timeout has elapsed since the last failure.
    pub fn is_open(&self) -> bool {
        let mut state = self.lock();
        if state.failure_count < self.config.circuit_breaker_threshold {
            return false;
        }

        match state.last_failure_time {
            Some(last) if last.elapsed() < Duration::from_secs(self.config.circuit_breaker_reset_secs) => true,
            _ => {
                debug!(provider = %self.name, "Circuit breaker reset timeout elapsed, closing");
                *state = BreakerState::default();
                false
            }
        }
    }

    /// Record a failed provider call
    pub fn record_failure(&self) {
        let mut state = self.lock();
        state.failure_count += 1;
        state.last_failure_time = Some(Instant::now());
        if state.failure_count == self.config.circuit_breaker_threshold {
            warn!(
                provider = %self.name,
                failures = state.failure_count,
                "Circuit breaker opened"
            );
        }
    }

    /// Record a successful provider call, closing the circuit
    pub fn record_success(&self) {
        *self.lock() = BreakerState::default();
    }

    /// Run `operation` behind the breaker, retrying transient failures
    ///
    /// Only [`LookupError::is_transient`] errors are retried and counted as
    /// provider failures; a definitive answer such as `NotFound` proves the
    /// provider is healthy.
    pub async fn call<T, F, Fut>(&self, mut operation: F) -> Result<T, LookupError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LookupError>>,
    {
        if self.is_open() {
            return Err(LookupError::CircuitOpen(format!(
                "{} is failing, retry later",
                self.name
            )));
        }

        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => {
                    self.record_success();
                    return Ok(value);
                }
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    let delay = backoff_delay(&self.config, attempt);
                    warn!(
                        provider = %self.name,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Provider call failed, retrying"
                    );
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_transient() => {
                    self.record_failure();
                    return Err(e);
                }
                Err(e) => {
                    self.record_success();
                    return Err(e);
                }
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Exponential backoff capped at `max_retry_delay_ms`, plus up to 25% jitter
pub fn backoff_delay(config: &RecoveryConfig, attempt: u32) -> Duration {
    let exponential = config
        .base_retry_delay_ms
        .saturating_mul(1u64 << attempt.min(16));
    let capped = exponential.min(config.max_retry_delay_ms);
    let jitter = rand::thread_rng().gen_range(0..=capped / 4);
    Duration::from_millis(capped + jitter)
}
