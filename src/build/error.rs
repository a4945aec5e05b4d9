//! Error type for a build run.

use crate::build::engine::EngineError;
use crate::config::ConfigError;
use thiserror::Error;

/// Error that aborted a build run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuildError {
    /// Targets, options or configuration files were invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The engine failed to resolve or write a bundle
    #[error("error bundling {name}: {source}")]
    Bundle {
        /// Bundle name of the failed job
        name: String,
        /// Underlying engine error
        #[source]
        source: EngineError,
    },
    /// File I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A worker could not complete its job
    #[error("worker failed: {0}")]
    Worker(String),
}

impl BuildError {
    /// Wrap an engine failure for the job called `name`.
    pub fn bundle(name: impl Into<String>, source: EngineError) -> Self {
        Self::Bundle { name: name.into(), source }
    }
}
