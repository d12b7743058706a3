//! Circuit breaker guarding the upstream generation API.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: upstream assumed down, requests fail fast
//!
//! # State Transitions
//! ```text
//! Closed → Open:   consecutive_failures >= failure_threshold
//! Open → Closed:   reset timeout elapsed since last failure (checked in allow_request)
//! Open → Closed:   any recorded success
//! ```
//!
//! # Design Decisions
//! - One breaker per upstream, owned by the application state
//! - No half-open probe; the first request after the timeout goes through
//! - Every transition happens under a single mutex; the lock is never held across `.await`
//! - Clock is injectable through the `*_at` variants

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;

/// Mutable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitState {
    pub consecutive_failures: u32,
    pub last_failure: Option<Instant>,
    pub is_open: bool,
}

impl CircuitState {
    fn closed() -> Self {
        Self {
            consecutive_failures: 0,
            last_failure: None,
            is_open: false,
        }
    }
}

/// Consecutive-failure circuit breaker with timed reset.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<CircuitState>,
    failure_threshold: u32,
    reset_timeout: Duration,
}

impl CircuitBreaker {
    /// Create a closed breaker.
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            state: Mutex::new(CircuitState::closed()),
            failure_threshold,
            reset_timeout,
        }
    }

    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        Self::new(
            config.failure_threshold,
            Duration::from_secs(config.reset_timeout_secs),
        )
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    pub fn reset_timeout(&self) -> Duration {
        self.reset_timeout
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> CircuitState {
        *self.lock()
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_open
    }

    /// Whether a request may be sent to the upstream now.
    pub fn allow_request(&self) -> bool {
        self.allow_request_at(Instant::now())
    }

    /// Like [`allow_request`](Self::allow_request) with an explicit clock reading.
    pub fn allow_request_at(&self, now: Instant) -> bool {
        let mut state = self.lock();
        if !state.is_open {
            return true;
        }

        let Some(last_failure) = state.last_failure else {
            return false;
        };

        if now.saturating_duration_since(last_failure) > self.reset_timeout {
            *state = CircuitState::closed();
            drop(state);
            tracing::info!(
                reset_timeout_secs = self.reset_timeout.as_secs(),
                "Circuit breaker reset after timeout"
            );
            metrics::set_circuit_open(false);
            return true;
        }

        false
    }

    /// Clear the failure streak and close the circuit.
    pub fn record_success(&self) {
        let mut state = self.lock();
        let was_open = state.is_open;
        state.consecutive_failures = 0;
        state.is_open = false;
        drop(state);

        if was_open {
            tracing::info!("Circuit breaker closed after success");
            metrics::set_circuit_open(false);
        }
    }

    pub fn record_failure(&self) {
        self.record_failure_at(Instant::now());
    }

    /// Count a failure observed at `now`, opening the circuit on the threshold.
    pub fn record_failure_at(&self, now: Instant) {
        let mut state = self.lock();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        state.last_failure = Some(now);

        if state.consecutive_failures >= self.failure_threshold {
            let newly_opened = !state.is_open;
            state.is_open = true;
            let failures = state.consecutive_failures;
            drop(state);

            if newly_opened {
                tracing::warn!(failures, "Circuit breaker OPENED after {} failures", failures);
                metrics::set_circuit_open(true);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, CircuitState> {
        // State is plain counters; a panic elsewhere cannot leave it torn.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
