//! Exponential backoff with optional jitter.

use rand::Rng;
use std::time::Duration;

use crate::config::RetryConfig;

/// Calculate the delay after failed attempt number `attempt` (1-based).
///
/// `base_ms * 2^(attempt-1)`, capped at `max_ms`. With `jitter` up to 10% of
/// the delay is added on top.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64, jitter: bool) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    let jitter_range = capped_delay / 10;
    let jitter_ms = if jitter && jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter_ms)
}

/// Backoff delay for `attempt` using retry settings from config.
pub fn backoff_for(config: &RetryConfig, attempt: u32) -> Duration {
    calculate_backoff(attempt, config.base_delay_ms, config.max_delay_ms, config.jitter)
}
