//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout)
//! - Own the application state: one circuit breaker and one retrying caller
//!   shared by every request
//! - Serve on a listener until shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::RelayConfig;
use crate::http::handlers;
use crate::http::request::{make_span, MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use crate::prompts::PromptStore;
use crate::resilience::{CircuitBreaker, RetryingCaller};
use crate::upstream::{GeminiClient, Upstream, UpstreamError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub caller: Arc<RetryingCaller>,
    pub prompts: Arc<PromptStore>,
    pub config: Arc<RelayConfig>,
}

impl AppState {
    /// Compose state around an explicit upstream.
    pub fn new(config: RelayConfig, upstream: Arc<dyn Upstream>) -> Self {
        let breaker = Arc::new(CircuitBreaker::from_config(&config.circuit_breaker));
        let caller = Arc::new(RetryingCaller::new(
            upstream,
            breaker,
            config.retries.clone(),
        ));
        let prompts = Arc::new(PromptStore::from_config(&config.prompts));

        Self {
            caller,
            prompts,
            config: Arc::new(config),
        }
    }

    /// Compose state with the Gemini client described by the config.
    pub fn from_config(config: RelayConfig) -> Result<Self, UpstreamError> {
        let upstream = Arc::new(GeminiClient::new(&config.upstream)?);
        Ok(Self::new(config, upstream))
    }
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        let router = build_router(state.clone());
        Self { router, state }
    }

    /// Run the server until a shutdown signal is received.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            model = %self.state.caller.upstream().model(),
            configured = self.state.caller.upstream().is_configured(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.timeouts.request_secs);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api-status", get(handlers::api_status))
        .route("/generate/track", post(handlers::generate_track))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(TimeoutLayer::new(request_timeout))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}
