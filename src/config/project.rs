//! Project files consumed by the build
//!
//! - `package.json` for package names and entry points
//! - `postcss.json` for stylesheet vendor prefixing
//! - `.babelrc` for syntax downleveling
//!
//! Each file is optional except the manifest of a package being built.
//! A file that exists but does not parse is an error; it never silently
//! falls back to the defaults.

use super::loader::{ConfigError, MANIFEST_FILE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

/// Stylesheet post-processing configuration file name.
pub const STYLESHEET_CONFIG_FILE: &str = "postcss.json";

/// Syntax downlevel configuration file name.
pub const SYNTAX_CONFIG_FILE: &str = ".babelrc";

/// The fields of `package.json` the build cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    /// Package name, possibly scoped (`@org/name`)
    #[serde(default)]
    pub name: String,
    /// Bundled entry point
    #[serde(default)]
    pub main: Option<String>,
    /// ES module entry point, used as the bundle input when present
    #[serde(default)]
    pub module: Option<String>,
}

/// Vendor prefixing options for the stylesheet stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StylesheetConfig {
    /// Browser query list
    #[serde(default = "default_stylesheet_browsers")]
    pub browsers: Vec<String>,
    /// Any other keys are passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

fn default_stylesheet_browsers() -> Vec<String> {
    vec!["last 3 versions".to_string()]
}

impl Default for StylesheetConfig {
    fn default() -> Self {
        Self { browsers: default_stylesheet_browsers(), extra: serde_json::Map::new() }
    }
}

/// Syntax downlevel options, in `.babelrc` shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxConfig {
    /// Files the stage applies to
    #[serde(default = "default_syntax_include")]
    pub include: Vec<String>,
    /// Files the stage skips
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Emit compact output
    #[serde(default)]
    pub compact: bool,
    /// Preset list, each entry a name or a `[name, options]` pair
    #[serde(default)]
    pub presets: Vec<Value>,
    /// Plugin list, each entry a name or a `[name, options]` pair
    #[serde(default)]
    pub plugins: Vec<Value>,
    /// Import helpers from the runtime instead of inlining them
    #[serde(default, rename = "runtimeHelpers")]
    pub runtime_helpers: bool,
}

fn default_syntax_include() -> Vec<String> {
    vec!["**/*.{js,jsx}".to_string()]
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        Self {
            include: default_syntax_include(),
            exclude: Vec::new(),
            compact: false,
            presets: vec![json!([
                "env",
                {
                    "targets": { "browsers": ["ie >= 11", "safari >= 8"] },
                    "modules": false
                }
            ])],
            plugins: vec![json!("transform-inline-environment-variables")],
            runtime_helpers: false,
        }
    }
}

/// Read the manifest in `dir`.
pub fn load_manifest(dir: &Path) -> Result<PackageManifest, ConfigError> {
    let path = dir.join(MANIFEST_FILE);
    let contents = fs::read_to_string(&path)?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Json { path, source })
}

/// Stylesheet options from `postcss.json`, or the defaults.
pub fn load_stylesheet_config(project_root: &Path) -> Result<StylesheetConfig, ConfigError> {
    let path = project_root.join(STYLESHEET_CONFIG_FILE);
    if !path.is_file() {
        return Ok(StylesheetConfig::default());
    }
    let contents = fs::read_to_string(&path)?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Json { path, source })
}

/// Syntax options from `.babelrc`, or the defaults.
///
/// Runtime helpers are always switched on, whichever source is used.
pub fn load_syntax_config(project_root: &Path) -> Result<SyntaxConfig, ConfigError> {
    let path = project_root.join(SYNTAX_CONFIG_FILE);
    let mut config = if path.is_file() {
        let contents = fs::read_to_string(&path)?;
        json5::from_str::<SyntaxConfig>(&contents)
            .map_err(|source| ConfigError::Json5 { path, source })?
    } else {
        SyntaxConfig::default()
    };
    config.runtime_helpers = true;
    Ok(config)
}
