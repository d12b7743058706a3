//! Prompt templates.
//!
//! # Data Flow
//! ```text
//! request body
//!     → defaults.rs (merge with default context)
//!     → PromptStore::render(name, context)
//!         → read <directory>/<name> from disk
//!         → render.rs (substitute placeholders)
//!     → prompt text for the upstream
//! ```
//!
//! Templates are read on every render so edits take effect without a restart.

pub mod defaults;
pub mod render;

use std::path::{Component, Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::PromptConfig;

pub use defaults::{merge_context, DEFAULTS};

/// Template used by the track generation endpoint.
pub const TRACK_PROMPT: &str = "track_prompt.txt";

/// Errors raised while loading or rendering a template.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt template '{0}' not found.")]
    NotFound(String),

    #[error("Prompt template name '{0}' is not a plain file name")]
    InvalidName(String),

    #[error("failed to read prompt template '{name}': {source}")]
    Io {
        name: String,
        source: std::io::Error,
    },

    #[error("missing value for placeholder '{0}'")]
    MissingValue(String),

    #[error("positional placeholders are not supported")]
    PositionalPlaceholder,

    #[error("unbalanced brace in template")]
    UnbalancedBrace,
}

/// Loads templates from a directory.
#[derive(Debug, Clone)]
pub struct PromptStore {
    directory: PathBuf,
}

impl PromptStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn from_config(config: &PromptConfig) -> Self {
        Self::new(&config.directory)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Read a template by file name.
    pub fn load(&self, name: &str) -> Result<String, PromptError> {
        let mut components = Path::new(name).components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return Err(PromptError::InvalidName(name.to_string()));
        }

        let path = self.directory.join(name);
        if !path.is_file() {
            return Err(PromptError::NotFound(name.to_string()));
        }

        std::fs::read_to_string(&path).map_err(|source| PromptError::Io {
            name: name.to_string(),
            source,
        })
    }

    /// Load and render a template.
    pub fn render(&self, name: &str, context: &Map<String, Value>) -> Result<String, PromptError> {
        let template = self.load(name)?;
        render::render(&template, context)
    }
}
