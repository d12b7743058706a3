//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the metrics exporter when enabled
//! - Build the application state (upstream client, breaker, prompts)
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::RelayConfig;
use crate::http::{AppState, HttpServer};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::upstream::UpstreamError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build upstream client: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the relay with a validated configuration until a shutdown signal.
pub async fn run(config: RelayConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    if !config.upstream.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
        tracing::warn!("No upstream API key configured; generation requests will fail");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        model = %config.upstream.model,
        max_attempts = config.retries.max_attempts,
        failure_threshold = config.circuit_breaker.failure_threshold,
        reset_timeout_secs = config.circuit_breaker.reset_timeout_secs,
        prompts = %config.prompts.directory,
        "Configuration loaded"
    );

    let bind_address = config.listener.bind_address.clone();
    let state = AppState::from_config(config)?;
    let server = HttpServer::new(state);

    let shutdown = Arc::new(Shutdown::new());
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    let listener = TcpListener::bind(&bind_address).await?;
    server.run(listener, shutdown.subscribe()).await?;

    Ok(())
}
