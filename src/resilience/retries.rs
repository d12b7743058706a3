//! Retrying caller around the upstream generation API.
//!
//! # Responsibilities
//! - Short-circuit when the breaker is open (no upstream call, nothing recorded)
//! - Attempt the upstream call up to `max_attempts` times with exponential backoff
//! - Stop at once on non-retryable kinds (credentials, quota)
//! - Record exactly one success or one failure in the breaker per call, including
//!   calls abandoned mid-flight (e.g. by an inbound request timeout)
//! - Convert upstream errors into [`GenerationError`]; nothing above this sees raw upstream errors

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::resilience::backoff::backoff_for;
use crate::resilience::circuit_breaker::CircuitBreaker;
use crate::resilience::classify::{classify, ErrorKind};
use crate::upstream::Upstream;

/// Characters of prompt/output text included in debug logs.
const LOG_PREVIEW_CHARS: usize = 200;

/// A failed generation, tagged with its classified kind.
///
/// `message` holds the raw upstream text for logs; use
/// [`ErrorKind::message`] for anything user-facing.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct GenerationError {
    pub kind: ErrorKind,
    pub message: String,
}

impl GenerationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        self.kind.message()
    }
}

/// Result of a single upstream attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
    Success { text: String, elapsed: Duration },
    Failure { kind: ErrorKind, raw_message: String, elapsed: Duration },
}

/// Breaker accounting for one call that reached the upstream.
///
/// Settles exactly once. Dropping it unsettled counts as a failure, so a
/// caller cancelled while waiting on a hanging upstream still moves the
/// breaker towards open.
struct BreakerCallGuard<'a> {
    breaker: &'a CircuitBreaker,
    request_id: &'a str,
    settled: bool,
}

impl<'a> BreakerCallGuard<'a> {
    fn new(breaker: &'a CircuitBreaker, request_id: &'a str) -> Self {
        Self {
            breaker,
            request_id,
            settled: false,
        }
    }

    fn succeed(mut self) {
        self.settled = true;
        self.breaker.record_success();
    }

    fn fail(mut self) {
        self.settled = true;
        self.breaker.record_failure();
    }
}

impl Drop for BreakerCallGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!(request_id = %self.request_id, "Generation abandoned before completion");
            metrics::record_generation_error(ErrorKind::Timeout);
            self.breaker.record_failure();
        }
    }
}

/// Coordinates attempts against the upstream with a shared circuit breaker.
pub struct RetryingCaller {
    upstream: Arc<dyn Upstream>,
    breaker: Arc<CircuitBreaker>,
    retry_config: RetryConfig,
}

impl RetryingCaller {
    pub fn new(
        upstream: Arc<dyn Upstream>,
        breaker: Arc<CircuitBreaker>,
        retry_config: RetryConfig,
    ) -> Self {
        Self {
            upstream,
            breaker,
            retry_config,
        }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn upstream(&self) -> &Arc<dyn Upstream> {
        &self.upstream
    }

    /// Generate with the configured number of attempts.
    pub async fn generate(&self, prompt: &str, endpoint: &str) -> Result<String, GenerationError> {
        self.generate_with_resilience(prompt, endpoint, self.retry_config.max_attempts)
            .await
    }

    /// Generate text, retrying transient failures up to `max_attempts` times.
    pub async fn generate_with_resilience(
        &self,
        prompt: &str,
        endpoint: &str,
        max_attempts: u32,
    ) -> Result<String, GenerationError> {
        let request_id = short_request_id();

        if !self.breaker.allow_request() {
            tracing::warn!(request_id = %request_id, endpoint, "Circuit breaker is OPEN");
            metrics::record_generation_error(ErrorKind::CircuitOpen);
            return Err(GenerationError::new(
                ErrorKind::CircuitOpen,
                "Circuit breaker is open",
            ));
        }

        tracing::info!(request_id = %request_id, endpoint, "Request to upstream");
        tracing::debug!(request_id = %request_id, prompt = %preview(prompt), "Prompt");

        let guard = BreakerCallGuard::new(&self.breaker, &request_id);
        let mut last_failure: Option<(ErrorKind, String)> = None;

        for attempt in 1..=max_attempts {
            tracing::info!(request_id = %request_id, attempt, max_attempts, "Attempt");

            match self.attempt(prompt).await {
                AttemptOutcome::Success { text, elapsed } => {
                    tracing::info!(
                        request_id = %request_id,
                        attempt,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "SUCCESS in {:.2}s",
                        elapsed.as_secs_f64()
                    );
                    tracing::debug!(request_id = %request_id, output = %preview(&text), "Output");
                    guard.succeed();
                    return Ok(text);
                }
                AttemptOutcome::Failure {
                    kind,
                    raw_message,
                    elapsed,
                } => {
                    tracing::error!(
                        request_id = %request_id,
                        attempt,
                        kind = %kind,
                        elapsed_ms = elapsed.as_millis() as u64,
                        error = %raw_message,
                        "Upstream attempt failed"
                    );

                    if !kind.is_retryable() {
                        guard.fail();
                        metrics::record_generation_error(kind);
                        return Err(GenerationError::new(kind, raw_message));
                    }

                    last_failure = Some((kind, raw_message));

                    if attempt < max_attempts {
                        let delay = backoff_for(&self.retry_config, attempt);
                        tracing::info!(request_id = %request_id, attempt, delay = ?delay, "Retrying request");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        guard.fail();
        let (kind, message) =
            last_failure.unwrap_or((ErrorKind::Unknown, "no attempts were made".to_string()));
        metrics::record_generation_error(kind);
        Err(GenerationError::new(kind, message))
    }

    async fn attempt(&self, prompt: &str) -> AttemptOutcome {
        let start = Instant::now();
        let result = self.upstream.generate(prompt).await;
        let elapsed = start.elapsed();

        match result {
            Ok(text) => {
                metrics::record_attempt("success", elapsed);
                AttemptOutcome::Success { text, elapsed }
            }
            Err(e) => {
                metrics::record_attempt("failure", elapsed);
                let raw_message = e.to_string();
                AttemptOutcome::Failure {
                    kind: classify(&raw_message),
                    raw_message,
                    elapsed,
                }
            }
        }
    }
}

fn short_request_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
