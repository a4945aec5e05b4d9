//! Full pipeline overrides.
//!
//! A project can replace the synthesized pipeline entirely by shipping an
//! `rna.config.json` (JSON5) in its root. The file holds a serialized
//! [`Pipeline`]; `input` and `output` may be omitted and are then taken from
//! the job being built.

use super::loader::ConfigError;
use crate::build::Pipeline;
use std::fs;
use std::path::Path;

/// Pipeline override file name.
pub const OVERRIDE_FILE: &str = "rna.config.json";

/// Source of a full pipeline override.
pub trait ConfigProvider: Send + Sync {
    /// Return the override pipeline for the project, if there is one.
    fn provide(&self, project_root: &Path) -> Result<Option<Pipeline>, ConfigError>;
}

/// Reads `rna.config.json` from the project root.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileConfigProvider;

impl ConfigProvider for FileConfigProvider {
    fn provide(&self, project_root: &Path) -> Result<Option<Pipeline>, ConfigError> {
        let path = project_root.join(OVERRIDE_FILE);
        if !path.is_file() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)?;
        let mut pipeline: Pipeline = json5::from_str(&contents)
            .map_err(|source| ConfigError::Json5 { path: path.clone(), source })?;
        if let Some(output) = pipeline.output.take() {
            pipeline.output = Some(super::loader::resolve_path(project_root, &output));
        }
        if !pipeline.input.as_os_str().is_empty() {
            pipeline.input = super::loader::resolve_path(project_root, &pipeline.input);
        }

        tracing::info!(path = %path.display(), "using pipeline override");
        pipeline.origin = Some(path);
        Ok(Some(pipeline))
    }
}

/// Never overrides; every job gets the synthesized pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOverride;

impl ConfigProvider for NoOverride {
    fn provide(&self, _project_root: &Path) -> Result<Option<Pipeline>, ConfigError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{BundleFormat, SourceMap, Stage};
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_no_override_file() {
        let temp = TempDir::new().unwrap();
        assert!(FileConfigProvider.provide(temp.path()).unwrap().is_none());
    }

    #[test]
    fn test_override_file_parsed() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(OVERRIDE_FILE),
            r#"{
                // hand-written pipeline
                output: 'public/app.js',
                format: 'es',
                stages: [{ stage: 'dependency-resolution' }, { stage: 'commonjs-interop' }],
            }"#,
        )
        .unwrap();

        let pipeline = FileConfigProvider.provide(temp.path()).unwrap().unwrap();
        assert_eq!(pipeline.output, Some(temp.path().join("public/app.js")));
        assert_eq!(pipeline.format, BundleFormat::Es);
        assert_eq!(pipeline.stages, vec![Stage::DependencyResolution, Stage::CommonjsInterop]);
        assert_eq!(pipeline.input, PathBuf::new());
        assert_eq!(pipeline.origin, Some(temp.path().join(OVERRIDE_FILE)));
    }

    #[test]
    fn test_override_sourcemap_modes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(OVERRIDE_FILE);

        fs::write(&path, "{ sourcemap: 'disabled', stages: [] }").unwrap();
        let pipeline = FileConfigProvider.provide(temp.path()).unwrap().unwrap();
        assert_eq!(pipeline.sourcemap, SourceMap::Disabled);

        // Only inline maps are produced, so a separate map file is rejected.
        fs::write(&path, "{ sourcemap: 'enabled', stages: [] }").unwrap();
        let result = FileConfigProvider.provide(temp.path());
        assert!(matches!(result, Err(ConfigError::Json5 { .. })));
    }

    #[test]
    fn test_malformed_override_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(OVERRIDE_FILE), "{ stages: [ ").unwrap();

        let result = FileConfigProvider.provide(temp.path());
        match result {
            Err(err @ ConfigError::Json5 { .. }) => {
                let source = std::error::Error::source(&err).unwrap();
                assert!(source.downcast_ref::<json5::Error>().is_some());
            }
            other => panic!("expected json5 error, got {:?}", other),
        }
    }

    #[test]
    fn test_null_provider() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(OVERRIDE_FILE), "{}").unwrap();
        assert!(NoOverride.provide(temp.path()).unwrap().is_none());
    }
}
