//! Configuration loading from disk and environment.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply environment
/// overrides, then validate.
///
/// Without a path the built-in defaults are used.
pub fn load(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => RelayConfig::default(),
    };

    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    load(Some(path))
}

fn read_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut RelayConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply overrides using `lookup` as the environment.
///
/// - `GEMINI_API_KEY` → `upstream.api_key`
/// - `RELAY_BIND_ADDRESS` → `listener.bind_address`
/// - `RELAY_PORT` → port of `listener.bind_address`
/// - `RELAY_LOG_LEVEL` → `observability.log_level`
pub fn apply_overrides_from<F>(config: &mut RelayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup("GEMINI_API_KEY").filter(|k| !k.is_empty()) {
        config.upstream.api_key = Some(key);
    }

    if let Some(addr) = lookup("RELAY_BIND_ADDRESS") {
        config.listener.bind_address = addr;
    }

    if let Some(port) = lookup("RELAY_PORT") {
        match (
            config.listener.bind_address.parse::<SocketAddr>(),
            port.parse::<u16>(),
        ) {
            (Ok(mut addr), Ok(port)) => {
                addr.set_port(port);
                config.listener.bind_address = addr.to_string();
            }
            _ => tracing::warn!(port = %port, "Ignoring invalid RELAY_PORT override"),
        }
    }

    if let Some(level) = lookup("RELAY_LOG_LEVEL") {
        config.observability.log_level = level;
    }
}
