//! Build context containing configuration and paths for a build.

use crate::config::{find_project_root_from, load_config, ConfigError, RnaConfig};
use std::path::{Path, PathBuf};

/// Build context containing configuration and paths for a build operation.
///
/// The project root is where `package.json` lives; relative outputs are
/// resolved against it. The working directory is where command-line
/// specifiers are resolved from.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// The loaded configuration
    config: RnaConfig,
    /// Project root directory (nearest `package.json`)
    project_root: PathBuf,
    /// Directory specifiers are relative to
    working_dir: PathBuf,
}

impl BuildContext {
    /// Create a new build context.
    ///
    /// # Arguments
    /// - `config` - The loaded configuration
    /// - `project_root` - The project root directory
    pub fn new(config: RnaConfig, project_root: PathBuf) -> Self {
        Self { config, working_dir: project_root.clone(), project_root }
    }

    /// Locate the project enclosing `working_dir` and load its settings.
    pub fn discover(working_dir: &Path) -> Result<Self, ConfigError> {
        let project_root = find_project_root_from(working_dir.to_path_buf())
            .ok_or_else(|| ConfigError::NoProject { start: working_dir.to_path_buf() })?;
        let config = load_config(&project_root)?;
        Ok(Self::new(config, project_root).with_working_dir(working_dir.to_path_buf()))
    }

    /// Set the directory specifiers are resolved from.
    pub fn with_working_dir(mut self, working_dir: PathBuf) -> Self {
        self.working_dir = working_dir;
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &RnaConfig {
        &self.config
    }

    /// Mutable access to the configuration, for command-line overrides.
    pub fn config_mut(&mut self) -> &mut RnaConfig {
        &mut self.config
    }

    /// Get the project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get the working directory.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Number of worker threads configured.
    pub fn jobs(&self) -> usize {
        self.config.build.jobs.max(1)
    }

    /// Resolve a path relative to the project root.
    ///
    /// If the path is absolute, returns it unchanged.
    /// If relative, joins it with the project root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}
