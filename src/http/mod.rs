//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! POST /generate/track
//!     → request.rs (request ID, tracing span)
//!     → handlers.rs (decode body, merge defaults, render prompt)
//!     → RetryingCaller (breaker, retries, upstream)
//!     → parsing (structured output recovery)
//!     → response.rs (error mapping) / JSON body
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::ApiError;
pub use server::{build_router, AppState, HttpServer};
