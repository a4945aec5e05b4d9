//! Engine backed by an external bundler command.
//!
//! Resolution happens in process (see [`ModuleGraph`]). Writing spawns the
//! configured command once per artifact:
//!
//! - stdin receives a JSON document with the pipeline, the destination, the
//!   resolved module list and the external specifiers
//! - `RNA_INPUT` and `RNA_OUTPUT` hold the entry and destination paths
//! - each stdout line is either a JSON diagnostic
//!   (`{"category": "this-rewrite", "message": "..."}`) or plain text
//! - stderr lines of a successful run are plain-text warnings
//! - a non-zero exit status fails the job with the captured stderr

use super::{Artifact, BundleEngine, EngineError, ModuleGraph, Resolved};
use crate::build::{Diagnostic, Pipeline};
use crate::config::BuildSettings;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Environment variable carrying the entry module path.
pub const INPUT_ENV: &str = "RNA_INPUT";

/// Environment variable carrying the artifact path.
pub const OUTPUT_ENV: &str = "RNA_OUTPUT";

/// Engine that delegates code generation to a bundler command.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    command: String,
    args: Vec<String>,
    working_dir: PathBuf,
}

impl CommandEngine {
    /// Create an engine running `command` from `working_dir`.
    pub fn new(command: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self { command: command.into(), args: Vec::new(), working_dir: working_dir.into() }
    }

    /// Create an engine from `rna.toml` build settings.
    pub fn from_settings(settings: &BuildSettings, working_dir: impl Into<PathBuf>) -> Self {
        Self::new(settings.bundler.clone(), working_dir).with_args(settings.bundler_args.clone())
    }

    /// Set extra command arguments.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// The bundler command.
    pub fn command(&self) -> &str {
        &self.command
    }

    fn payload(
        &self,
        graph: &ModuleGraph,
        pipeline: &Pipeline,
        destination: &Path,
    ) -> Result<Vec<u8>, EngineError> {
        let document = serde_json::json!({
            "pipeline": pipeline,
            "output": destination,
            "modules": graph.module_paths(),
            "externals": graph.externals(),
        });
        serde_json::to_vec(&document).map_err(|e| EngineError::Write {
            destination: destination.to_path_buf(),
            message: format!("cannot encode pipeline: {}", e),
        })
    }
}

/// Parse bundler stdout into diagnostics.
pub fn parse_diagnostics(stdout: &str) -> Vec<Diagnostic> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            serde_json::from_str::<Diagnostic>(line).unwrap_or_else(|_| Diagnostic::classify(line))
        })
        .collect()
}

impl BundleEngine for CommandEngine {
    type Graph = ModuleGraph;

    fn resolve(
        &self,
        pipeline: &Pipeline,
        previous: Option<&ModuleGraph>,
    ) -> Result<Resolved<ModuleGraph>, EngineError> {
        let graph = ModuleGraph::resolve(&pipeline.input, previous)?;
        Ok(Resolved { graph, diagnostics: Vec::new() })
    }

    fn write(
        &self,
        graph: &ModuleGraph,
        pipeline: &Pipeline,
        destination: &Path,
    ) -> Result<Artifact, EngineError> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = self.payload(graph, pipeline, destination)?;

        tracing::debug!(
            command = %self.command,
            destination = %destination.display(),
            "spawning bundler"
        );
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .env(INPUT_ENV, &pipeline.input)
            .env(OUTPUT_ENV, destination)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EngineError::Spawn { command: self.command.clone(), source })?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(&payload) {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => return Err(e.into()),
                _ => {}
            }
        }

        let output = child.wait_with_output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let message = match stderr.trim() {
                "" => format!("bundler exited with {}", output.status),
                text => text.to_string(),
            };
            return Err(EngineError::Write { destination: destination.to_path_buf(), message });
        }
        if !destination.is_file() {
            return Err(EngineError::Write {
                destination: destination.to_path_buf(),
                message: "bundler reported success but wrote no artifact".to_string(),
            });
        }

        let mut diagnostics = parse_diagnostics(&stdout);
        diagnostics.extend(
            stderr.lines().map(str::trim).filter(|l| !l.is_empty()).map(Diagnostic::classify),
        );
        Ok(Artifact { path: destination.to_path_buf(), diagnostics })
    }
}
