//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Generation request:
//!     → circuit_breaker.rs (fail fast with CircuitOpen when tripped)
//!     → retries.rs (call upstream, retry transient failures)
//!         → classify.rs (raw upstream error text → ErrorKind)
//!         → backoff.rs (1s, 2s, 4s, … between attempts)
//!     → circuit_breaker.rs (one success or one failure recorded per request)
//! ```
//!
//! # Design Decisions
//! - The breaker is shared by every request through `Arc`
//! - Credential and quota failures are never retried
//! - Callers only ever see [`GenerationError`], never upstream error types

pub mod backoff;
pub mod circuit_breaker;
pub mod classify;
pub mod retries;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use classify::{classify, ErrorKind};
pub use retries::{AttemptOutcome, GenerationError, RetryingCaller};
