//! Bundling pipeline description.
//!
//! A [`Pipeline`] is a plain description of one bundling job: entry,
//! destination, output format, and the ordered transformation stages the
//! engine applies. [`PipelineBuilder`] synthesizes it from the job's
//! options and the project's configuration files; it performs no bundling.
//!
//! Default stage order:
//!
//! 1. `dependency-resolution`
//! 2. `json-import`
//! 3. `text-asset-inline`
//! 4. `binary-asset-inline`
//! 5. `stylesheet`
//! 6. `jsx-transform`
//! 7. `syntax-downlevel`
//! 8. `commonjs-interop`
//! 9. `minify` (production only)

use crate::build::diagnostics::DiagnosticCategory;
use crate::build::output::{resolve_output, stylesheet_path};
use crate::build::{BuildOptions, SourceMap};
use crate::config::{
    load_stylesheet_config, load_syntax_config, ConfigError, ConfigProvider, StylesheetConfig,
    SyntaxConfig,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Assets up to this size are inlined; larger ones are copied.
pub const BINARY_INLINE_LIMIT: u64 = 10 * 1000 * 1024;

/// Comments matching this pattern survive minification.
pub const PRESERVED_COMMENTS: &str = "@license";

/// JSX factory used by the jsx stage.
pub const JSX_PRAGMA: &str = "IDOM.h";

/// Import prepended to every JSX module.
pub const JSX_HEADER: &str = "import { IDOM } from '@dnajs/idom';";

/// Output module format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleFormat {
    /// Universal module definition
    #[default]
    Umd,
    /// ES module
    Es,
    /// CommonJS
    Cjs,
    /// Immediately-invoked function expression
    Iife,
}

/// Stylesheet output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    /// Readable output
    #[default]
    Expanded,
    /// Whitespace stripped
    Compressed,
}

/// Parameters of the stylesheet stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StylesheetStage {
    /// Files handled by the stage
    pub include: Vec<String>,
    /// Vendor prefixing options
    #[serde(default)]
    pub prefixer: StylesheetConfig,
    /// Sibling `.css` file to extract into, or `None` to inject at runtime
    #[serde(default)]
    pub extract: Option<PathBuf>,
    /// Embed source maps
    #[serde(default)]
    pub source_map: bool,
    /// Output style
    #[serde(default)]
    pub output_style: OutputStyle,
}

/// One transformation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "kebab-case")]
pub enum Stage {
    /// Resolve bare imports from `node_modules`
    DependencyResolution,
    /// Import `.json` files as modules
    JsonImport,
    /// Import text files as strings
    TextAssetInline {
        /// Files handled by the stage
        include: Vec<String>,
    },
    /// Import binary files as data URLs up to `limit` bytes
    BinaryAssetInline {
        /// Files handled by the stage
        include: Vec<String>,
        /// Largest inlined asset in bytes
        limit: u64,
    },
    /// Compile and prefix stylesheets
    Stylesheet(StylesheetStage),
    /// Compile JSX with a fixed pragma and header
    JsxTransform {
        /// Files handled by the stage
        include: Vec<String>,
        /// JSX factory
        pragma: String,
        /// Import prepended to each module
        header: String,
    },
    /// Downlevel syntax for the target browsers
    SyntaxDownlevel(SyntaxConfig),
    /// Convert CommonJS modules to ES modules
    CommonjsInterop,
    /// Minify the output
    Minify {
        /// Comments matching this pattern are kept
        preserve_comments: String,
    },
}

impl Stage {
    /// Stable stage name, as used in serialized pipelines.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::DependencyResolution => "dependency-resolution",
            Stage::JsonImport => "json-import",
            Stage::TextAssetInline { .. } => "text-asset-inline",
            Stage::BinaryAssetInline { .. } => "binary-asset-inline",
            Stage::Stylesheet(_) => "stylesheet",
            Stage::JsxTransform { .. } => "jsx-transform",
            Stage::SyntaxDownlevel(_) => "syntax-downlevel",
            Stage::CommonjsInterop => "commonjs-interop",
            Stage::Minify { .. } => "minify",
        }
    }
}

/// Description of one bundling job, as handed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Entry module; an override may leave it empty to take the target's
    #[serde(default)]
    pub input: PathBuf,
    /// Artifact path
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Global name for UMD output
    #[serde(default)]
    pub name: Option<String>,
    /// Module format
    #[serde(default)]
    pub format: BundleFormat,
    /// Emit `"use strict"`
    #[serde(default)]
    pub strict: bool,
    /// Source map mode
    #[serde(default)]
    pub sourcemap: SourceMap,
    /// Ordered transformation stages
    #[serde(default)]
    pub stages: Vec<Stage>,
    /// Diagnostic categories hidden from the user
    #[serde(default)]
    pub suppressed: Vec<DiagnosticCategory>,
    /// Override file this pipeline was read from
    #[serde(skip)]
    pub origin: Option<PathBuf>,
}

impl Pipeline {
    /// Names of the stages, in order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(Stage::name).collect()
    }

    /// Whether a stage with the given name is present.
    pub fn has_stage(&self, name: &str) -> bool {
        self.stages.iter().any(|s| s.name() == name)
    }

    /// Whether this pipeline came from a project override file.
    pub fn is_override(&self) -> bool {
        self.origin.is_some()
    }
}

/// Builds the pipeline for each job.
pub struct PipelineBuilder<'a> {
    project_root: &'a Path,
    provider: &'a dyn ConfigProvider,
}

impl<'a> PipelineBuilder<'a> {
    /// Create a builder for a project.
    pub fn new(project_root: &'a Path, provider: &'a dyn ConfigProvider) -> Self {
        Self { project_root, provider }
    }

    /// Build the pipeline for a job whose options carry a resolved input.
    ///
    /// A pipeline from the configuration provider wins and is used as is,
    /// apart from filling a missing input or output from the options and
    /// expanding a directory-form override output.
    /// Without one, an output is required.
    pub fn build(&self, options: &BuildOptions) -> Result<Pipeline, ConfigError> {
        if let Some(mut pipeline) = self.provider.provide(self.project_root)? {
            if pipeline.input.as_os_str().is_empty() {
                pipeline.input = options.input.clone();
            }
            // A directory named by the override takes the input's file name;
            // job outputs are already file paths.
            pipeline.output = match pipeline.output.take() {
                Some(output) => Some(resolve_output(&output, &pipeline.input)),
                None => options.output.clone(),
            };
            if pipeline.output.is_none() {
                return Err(ConfigError::MissingOutput { input: pipeline.input });
            }
            return Ok(pipeline);
        }

        let output = options
            .output
            .clone()
            .ok_or_else(|| ConfigError::MissingOutput { input: options.input.clone() })?;

        let stylesheet = load_stylesheet_config(self.project_root)?;
        let syntax = load_syntax_config(self.project_root)?;

        let mut stages = vec![
            Stage::DependencyResolution,
            Stage::JsonImport,
            Stage::TextAssetInline { include: vec!["**/*.{html,txt,svg,md}".to_string()] },
            Stage::BinaryAssetInline {
                include: vec!["**/*.{woff,ttf,eot,gif,png,jpg}".to_string()],
                limit: BINARY_INLINE_LIMIT,
            },
            Stage::Stylesheet(StylesheetStage {
                include: vec!["**/*.{css,scss,sass}".to_string()],
                prefixer: stylesheet,
                extract: options.external_css.then(|| stylesheet_path(&output)),
                source_map: options.sourcemap.is_enabled(),
                output_style: if options.production {
                    OutputStyle::Compressed
                } else {
                    OutputStyle::Expanded
                },
            }),
            Stage::JsxTransform {
                include: vec!["**/*.jsx".to_string()],
                pragma: JSX_PRAGMA.to_string(),
                header: JSX_HEADER.to_string(),
            },
            Stage::SyntaxDownlevel(syntax),
            Stage::CommonjsInterop,
        ];
        if options.production {
            stages.push(Stage::Minify { preserve_comments: PRESERVED_COMMENTS.to_string() });
        }

        Ok(Pipeline {
            input: options.input.clone(),
            output: Some(output),
            name: options.name.clone(),
            format: BundleFormat::Umd,
            strict: false,
            sourcemap: options.sourcemap,
            stages,
            suppressed: DiagnosticCategory::suppressed(options.verbose),
            origin: None,
        })
    }
}
