//! AI relay service.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────────┐
//!                     │                        AI RELAY                           │
//!                     │                                                           │
//!   Client Request    │  ┌─────────┐   ┌──────────┐   ┌──────────────────────┐   │
//!   ──────────────────┼─▶│  http   │──▶│ prompts  │──▶│      resilience      │   │
//!                     │  │ handler │   │ defaults │   │ breaker → retries    │───┼──▶ Gemini API
//!                     │  └─────────┘   │ + render │   │ → classify / backoff │◀──┼───
//!                     │       ▲        └──────────┘   └──────────┬───────────┘   │
//!   Client Response   │       │                                  ▼               │
//!   ◀─────────────────┼───────┴──────────────────────────── parsing (JSON        │
//!                     │                                     recovery)           │
//!                     └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use ai_relay::config;
use ai_relay::lifecycle::startup;
use ai_relay::observability::logging;

#[derive(Parser)]
#[command(name = "ai-relay")]
#[command(about = "Relay structured requests to a generative-text API", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration, print it, and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = config::load(cli.config.as_deref())?;

    if cli.check {
        let mut printable = config.clone();
        if printable.upstream.api_key.is_some() {
            printable.upstream.api_key = Some("<redacted>".to_string());
        }
        println!("{}", toml::to_string_pretty(&printable)?);
        return Ok(());
    }

    logging::init(&config.observability.log_level);
    tracing::info!("ai-relay v{} starting", env!("CARGO_PKG_VERSION"));

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
