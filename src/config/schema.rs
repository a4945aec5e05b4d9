//! Configuration schema for `rna.toml`
//!
//! All sections are optional: a project without an `rna.toml` builds with
//! [`RnaConfig::default`].

use serde::{Deserialize, Serialize};

/// Build settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSettings {
    /// Worker pool size; 1 keeps jobs strictly sequential
    #[serde(default = "default_jobs")]
    pub jobs: usize,
    /// External bundler command driven by the command engine
    #[serde(default = "default_bundler")]
    pub bundler: String,
    /// Extra arguments passed to the bundler command
    #[serde(default)]
    pub bundler_args: Vec<String>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self { jobs: default_jobs(), bundler: default_bundler(), bundler_args: Vec::new() }
    }
}

fn default_jobs() -> usize {
    1
}

fn default_bundler() -> String {
    "rollup".to_string()
}

/// Watch mode configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Debounce delay in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
    /// Clear terminal between rebuilds
    #[serde(default)]
    pub clear_screen: bool,
}

fn default_debounce_ms() -> u32 {
    200
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: default_debounce_ms(), clear_screen: false }
    }
}

/// Complete rna.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RnaConfig {
    /// Build settings
    #[serde(default)]
    pub build: BuildSettings,
    /// Watch mode settings
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "build.jobs")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rna.toml: '{}' {}", self.field, self.message)
    }
}

impl RnaConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.build.jobs == 0 {
            errors.push(ConfigValidationError {
                field: "build.jobs".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        if self.build.bundler.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "build.bundler".to_string(),
                message: "must be a non-empty command".to_string(),
            });
        }

        if self.watch.debounce_ms == 0 {
            errors.push(ConfigValidationError {
                field: "watch.debounce_ms".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_parse() {
        let config: RnaConfig = toml::from_str("").unwrap();
        assert_eq!(config, RnaConfig::default());
        assert_eq!(config.build.jobs, 1);
        assert_eq!(config.build.bundler, "rollup");
        assert_eq!(config.watch.debounce_ms, 200);
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[build]
jobs = 4
bundler = "npx"
bundler_args = ["rollup", "--silent"]

[watch]
debounce_ms = 50
clear_screen = true
"#;
        let config: RnaConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.build.jobs, 4);
        assert_eq!(config.build.bundler, "npx");
        assert_eq!(config.build.bundler_args, vec!["rollup", "--silent"]);
        assert_eq!(config.watch.debounce_ms, 50);
        assert!(config.watch.clear_screen);
    }

    #[test]
    fn test_validate_default_is_valid() {
        assert!(RnaConfig::default().is_valid());
    }

    #[test]
    fn test_validate_zero_jobs() {
        let mut config = RnaConfig::default();
        config.build.jobs = 0;
        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "build.jobs");
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut config = RnaConfig::default();
        config.build.bundler = "  ".to_string();
        config.watch.debounce_ms = 0;
        let errors = config.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].to_string().contains("build.bundler"));
        assert!(errors[1].to_string().contains("watch.debounce_ms"));
    }
}
