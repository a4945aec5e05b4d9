//! Per-job build options.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Source map emission mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMap {
    /// No source map
    Disabled,
    /// Embedded in the artifact
    #[default]
    Inline,
}

impl SourceMap {
    /// Map the `--map[=bool]` command-line flag.
    pub fn from_flag(map: bool) -> Self {
        if map {
            SourceMap::Inline
        } else {
            SourceMap::Disabled
        }
    }

    /// Whether any source map is produced.
    pub fn is_enabled(self) -> bool {
        self != SourceMap::Disabled
    }
}

/// Options for one bundling job.
///
/// The command line produces one instance; the scheduler clones it per
/// target and fills in `input`, `output` and `name`. After resolution the
/// input and output are absolute.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Entry module
    pub input: PathBuf,
    /// Artifact path or directory
    pub output: Option<PathBuf>,
    /// Global name of the UMD bundle
    pub name: Option<String>,
    /// Source map mode
    pub sourcemap: SourceMap,
    /// Production build (minified, compressed stylesheets)
    pub production: bool,
    /// Extract stylesheets into a sibling `.css` file
    pub external_css: bool,
    /// Surface every bundler warning
    pub verbose: bool,
}

impl BuildOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entry module.
    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.input = input.into();
        self
    }

    /// Set the output path.
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Set the bundle name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the source map mode.
    pub fn with_sourcemap(mut self, sourcemap: SourceMap) -> Self {
        self.sourcemap = sourcemap;
        self
    }

    /// Set production mode.
    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    /// Set stylesheet extraction.
    pub fn with_external_css(mut self, external_css: bool) -> Self {
        self.external_css = external_css;
        self
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = BuildOptions::new();
        assert_eq!(options.sourcemap, SourceMap::Inline);
        assert!(!options.production);
        assert!(options.output.is_none());
        assert!(options.name.is_none());
    }

    #[test]
    fn test_sourcemap_from_flag() {
        assert_eq!(SourceMap::from_flag(true), SourceMap::Inline);
        assert_eq!(SourceMap::from_flag(false), SourceMap::Disabled);
        assert!(!SourceMap::Disabled.is_enabled());
        assert!(SourceMap::Inline.is_enabled());
    }

    #[test]
    fn test_clones_are_independent() {
        let base = BuildOptions::new().with_output("dist").with_production(true);
        let mut job = base.clone();
        job.output = Some(PathBuf::from("/elsewhere/out.js"));
        job.name = Some("Widget".to_string());

        assert_eq!(base.output, Some(PathBuf::from("dist")));
        assert!(base.name.is_none());
        assert!(job.production);
    }
}
