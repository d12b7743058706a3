//! Upstream error classification.
//!
//! Maps the text of a failed upstream call onto the relay's fixed error
//! taxonomy. Matching is a case-insensitive substring search and the first
//! rule that matches wins:
//!
//! ```text
//! "401" | "api key"       → InvalidCredentials
//! "429" | "quota"         → QuotaExceeded
//! "503" | "unavailable"   → ServiceUnavailable
//! "timeout"               → Timeout
//! anything else           → Unknown
//! ```
//!
//! `RateLimited` and `CircuitOpen` are never produced here. `CircuitOpen` comes
//! from the local breaker guard; `RateLimited` is kept in the taxonomy so the
//! user-facing message table stays complete.

use std::fmt;

/// Classified failure kind for a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidCredentials,
    QuotaExceeded,
    RateLimited,
    ServiceUnavailable,
    CircuitOpen,
    Timeout,
    Unknown,
}

impl ErrorKind {
    /// Human-readable message safe to show to end users.
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::InvalidCredentials => "API key is invalid or expired.",
            ErrorKind::QuotaExceeded => "API quota exceeded.",
            ErrorKind::RateLimited => "Too many requests.",
            ErrorKind::ServiceUnavailable => "Gemini service unavailable.",
            ErrorKind::CircuitOpen => "Service temporarily disabled.",
            ErrorKind::Timeout => "Request timed out.",
            ErrorKind::Unknown => "An unexpected error occurred.",
        }
    }

    /// Stable label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidCredentials => "INVALID_API_KEY",
            ErrorKind::QuotaExceeded => "QUOTA_EXCEEDED",
            ErrorKind::RateLimited => "RATE_LIMITED",
            ErrorKind::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorKind::CircuitOpen => "CIRCUIT_OPEN",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::Unknown => "UNKNOWN",
        }
    }

    /// Whether another attempt against the upstream can help.
    ///
    /// Credential and quota failures are configuration problems; the circuit
    /// guard never reaches the upstream at all.
    pub fn is_retryable(self) -> bool {
        match self {
            ErrorKind::InvalidCredentials | ErrorKind::QuotaExceeded | ErrorKind::CircuitOpen => {
                false
            }
            ErrorKind::RateLimited
            | ErrorKind::ServiceUnavailable
            | ErrorKind::Timeout
            | ErrorKind::Unknown => true,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify raw upstream error text.
pub fn classify(raw_error: &str) -> ErrorKind {
    let error = raw_error.to_lowercase();

    if error.contains("401") || error.contains("api key") {
        ErrorKind::InvalidCredentials
    } else if error.contains("429") || error.contains("quota") {
        ErrorKind::QuotaExceeded
    } else if error.contains("503") || error.contains("unavailable") {
        ErrorKind::ServiceUnavailable
    } else if error.contains("timeout") {
        ErrorKind::Timeout
    } else {
        ErrorKind::Unknown
    }
}
