//! Bundling engine seam.
//!
//! The orchestrator never bundles anything itself. An engine resolves the
//! module graph for a pipeline, optionally starting from the graph of the
//! previous build of the same input, and writes the artifact.
//!
//! [`CommandEngine`] is the shipped engine: it walks the import graph in
//! process and hands code generation to an external bundler command.

pub mod command;
pub mod graph;

pub use command::*;
pub use graph::*;

use crate::build::{Diagnostic, Pipeline};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error raised by an engine while resolving or writing a bundle.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// The graph could not be resolved
    #[error("failed to resolve {}: {message}", .input.display())]
    Resolve {
        /// Entry module
        input: PathBuf,
        /// Reason
        message: String,
    },
    /// A relative import points at nothing
    #[error("could not resolve '{specifier}' from {}", .importer.display())]
    UnresolvedImport {
        /// Module containing the import
        importer: PathBuf,
        /// Import specifier as written
        specifier: String,
    },
    /// A script could not be parsed
    #[error("failed to parse {}: {message}", .path.display())]
    Parse {
        /// Module path
        path: PathBuf,
        /// First syntax error reported by the parser
        message: String,
    },
    /// A module could not be read
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        /// Module path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// The bundler command could not be started
    #[error("failed to start bundler '{command}': {source}")]
    Spawn {
        /// Command name
        command: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// The artifact could not be written
    #[error("failed to write {}: {message}", .destination.display())]
    Write {
        /// Artifact path
        destination: PathBuf,
        /// Reason
        message: String,
    },
    /// File I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Outcome of resolving a pipeline.
#[derive(Debug)]
pub struct Resolved<G> {
    /// Resolved module graph
    pub graph: G,
    /// Warnings raised while resolving
    pub diagnostics: Vec<Diagnostic>,
}

/// Outcome of writing an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Path of the written artifact
    pub path: PathBuf,
    /// Warnings raised while writing
    pub diagnostics: Vec<Diagnostic>,
}

/// A bundling engine.
pub trait BundleEngine: Send + Sync {
    /// Resolved module graph; cached between builds of the same input.
    type Graph: Send + Sync;

    /// Resolve the module graph for a pipeline.
    ///
    /// `previous` is the graph from the last successful build of the same
    /// input, which the engine may reuse for unchanged modules.
    fn resolve(
        &self,
        pipeline: &Pipeline,
        previous: Option<&Self::Graph>,
    ) -> Result<Resolved<Self::Graph>, EngineError>;

    /// Generate and write the artifact for a resolved graph.
    fn write(
        &self,
        graph: &Self::Graph,
        pipeline: &Pipeline,
        destination: &Path,
    ) -> Result<Artifact, EngineError>;
}
