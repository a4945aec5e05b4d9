//! Project discovery and configuration loading
//!
//! A project is the nearest directory, walking up from the working
//! directory, that contains a `package.json`. Tool settings come from an
//! optional `rna.toml` next to it.

use super::schema::RnaConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Manifest file that marks a project or package directory.
pub const MANIFEST_FILE: &str = "package.json";

/// Tool settings file looked up in the project root.
pub const CONFIG_FILE: &str = "rna.toml";

/// Configuration error
///
/// Covers everything that can go wrong before a bundling job produces an
/// artifact: locating the project, reading its files, and deriving the
/// inputs and outputs of each target.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse rna.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
    /// No `package.json` found from the working directory upwards
    #[error("no project found.")]
    NoProject {
        /// Directory the search started from
        start: PathBuf,
    },
    /// A job has neither an override output nor an explicit output
    #[error("Missing 'output' option for {}.", .input.display())]
    MissingOutput {
        /// Input the job was building
        input: PathBuf,
    },
    /// A package declares no `main` and no output was given
    #[error("Missing 'output' property for {package} module.")]
    MissingMain {
        /// Package name
        package: String,
    },
    /// A specifier matched no file, directory or package
    #[error("no package or file matches '{specifier}'")]
    UnknownTarget {
        /// The specifier as given on the command line
        specifier: String,
    },
    /// A glob specifier could not be parsed
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The pattern as given
        pattern: String,
        /// Parser message
        message: String,
    },
    /// A JSON project file (`package.json`, `postcss.json`) is malformed
    #[error("failed to parse {}: {source}", .path.display())]
    Json {
        /// File that failed to parse
        path: PathBuf,
        /// Parser error
        #[source]
        source: serde_json::Error,
    },
    /// A JSON5 project file (`rna.config.json`, `.babelrc`) is malformed
    #[error("failed to parse {}: {source}", .path.display())]
    Json5 {
        /// File that failed to parse
        path: PathBuf,
        /// Parser error
        #[source]
        source: json5::Error,
    },
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Number of parallel jobs
    pub jobs: Option<usize>,
    /// Bundler command
    pub bundler: Option<String>,
    /// Watch debounce in milliseconds
    pub debounce_ms: Option<u32>,
}

/// Find the project root by walking up from the current working directory.
pub fn find_project_root() -> Result<PathBuf, ConfigError> {
    let cwd = env::current_dir()?;
    find_project_root_from(cwd.clone()).ok_or(ConfigError::NoProject { start: cwd })
}

/// Find the nearest directory containing a `package.json`, starting at
/// `start` and moving towards the filesystem root.
pub fn find_project_root_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        if current.join(MANIFEST_FILE).is_file() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load `rna.toml` from the project root, or defaults if it is absent.
pub fn load_config(project_root: &Path) -> Result<RnaConfig, ConfigError> {
    let path = project_root.join(CONFIG_FILE);
    if path.is_file() {
        load_config_file(&path)
    } else {
        Ok(default_config())
    }
}

/// Load configuration from a specific file path.
pub fn load_config_file(path: &Path) -> Result<RnaConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: RnaConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    tracing::debug!(path = %path.display(), "loaded tool settings");
    Ok(config)
}

/// Configuration used when a project has no `rna.toml`.
pub fn default_config() -> RnaConfig {
    RnaConfig::default()
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut RnaConfig, overrides: &CliOverrides) {
    if let Some(jobs) = overrides.jobs {
        config.build.jobs = jobs.max(1);
    }

    if let Some(ref bundler) = overrides.bundler {
        config.build.bundler = bundler.clone();
    }

    if let Some(debounce_ms) = overrides.debounce_ms {
        config.watch.debounce_ms = debounce_ms;
    }
}

/// Resolve a path relative to the project root.
///
/// If the path is absolute, returns it unchanged.
/// If relative, joins it with the project root.
pub fn resolve_path(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}
