//! AI relay library.
//!
//! Accepts structured requests, renders them into prompts, calls a remote
//! generative-text API through a retrying caller guarded by a circuit breaker,
//! and recovers structured JSON from the generated text.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod parsing;
pub mod prompts;
pub mod resilience;
pub mod upstream;

pub use config::schema::RelayConfig;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
pub use parsing::{parse_structured, ParsedResult};
pub use resilience::{classify, CircuitBreaker, ErrorKind, GenerationError, RetryingCaller};
pub use upstream::{Upstream, UpstreamError};
