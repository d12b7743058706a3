//! Upstream generative-text API.
//!
//! # Data Flow
//! ```text
//! RetryingCaller
//!     → Upstream::generate(prompt)
//!     → gemini.rs (HTTP call to the provider)
//!     → Ok(text) | Err(UpstreamError)   (message inspected by the classifier)
//! ```

pub mod gemini;

use async_trait::async_trait;
use thiserror::Error;

pub use gemini::GeminiClient;

/// Errors raised by an upstream implementation.
///
/// The `Display` text is what the error classifier inspects, so status codes
/// and provider messages are kept verbatim.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Provider answered with a non-success status.
    #[error("{status} {reason}: {message}")]
    Status {
        status: u16,
        reason: String,
        message: String,
    },

    /// Request did not complete within the client deadline.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Connection or protocol failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// Response body did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// No API key was configured.
    #[error("Gemini API key missing")]
    MissingApiKey,

    /// HTTP client could not be constructed.
    #[error("client build failed: {0}")]
    ClientBuild(String),
}

/// A text generation backend.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Generate text for a rendered prompt.
    async fn generate(&self, prompt: &str) -> Result<String, UpstreamError>;

    /// Whether credentials are present. Checked before a request is attempted.
    fn is_configured(&self) -> bool {
        true
    }

    /// Model identifier reported by the status endpoint.
    fn model(&self) -> &str {
        "unknown"
    }
}
