//! Build scheduler.
//!
//! Turns specifiers into jobs and runs them through the [`WorkerPool`],
//! stopping at the first failure. For each job:
//!
//! 1. Reuse the cached options of a previous build of the same input, or
//!    resolve the output path and bundle name
//! 2. Build the [`Pipeline`]
//! 3. Resolve the module graph, starting from the cached graph
//! 4. Write the artifact
//! 5. Record the graph and options in the [`BundleCache`]
//!
//! # Example
//!
//! ```ignore
//! use rna::build::{BuildContext, BuildOptions, BundleCache, CommandEngine, Scheduler};
//!
//! let context = BuildContext::discover(&std::env::current_dir()?)?;
//! let engine = CommandEngine::from_settings(&context.config().build, context.project_root());
//! let mut cache = BundleCache::new();
//! let outputs = Scheduler::new(&context, &engine, &mut cache)
//!     .run(&BuildOptions::new().with_output("dist"), &["src/index.js".to_string()])?;
//! ```

use crate::build::engine::BundleEngine;
use crate::build::error::BuildError;
use crate::build::naming::derive_name;
use crate::build::output::resolve_output;
use crate::build::progress::{
    NullProgress, ProgressEvent, ProgressReporter, ProgressTracker, TargetStatus,
};
use crate::build::{
    discover_targets, surface, BuildContext, BuildOptions, BundleCache, Diagnostic, Job, Pipeline,
    PipelineBuilder, WorkerPool,
};
use crate::config::{ConfigError, ConfigProvider, FileConfigProvider};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// Runs build jobs for one invocation against a shared cache.
pub struct Scheduler<'a, E: BundleEngine> {
    context: &'a BuildContext,
    engine: &'a E,
    cache: &'a mut BundleCache<E::Graph>,
    provider: &'a dyn ConfigProvider,
    reporter: &'a dyn ProgressReporter,
    jobs: usize,
}

impl<'a, E: BundleEngine> Scheduler<'a, E> {
    /// Create a scheduler reading overrides from `rna.config.json` and
    /// reporting nothing.
    pub fn new(
        context: &'a BuildContext,
        engine: &'a E,
        cache: &'a mut BundleCache<E::Graph>,
    ) -> Self {
        Self {
            context,
            engine,
            cache,
            provider: &FileConfigProvider,
            reporter: &NullProgress,
            jobs: context.jobs(),
        }
    }

    /// Set the configuration provider.
    pub fn with_provider(mut self, provider: &'a dyn ConfigProvider) -> Self {
        self.provider = provider;
        self
    }

    /// Set the progress reporter.
    pub fn with_reporter(mut self, reporter: &'a dyn ProgressReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Set the number of workers (at least 1).
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Build every target named by `specifiers`.
    ///
    /// Returns the artifact paths in job order, or the first error. Invalid
    /// targets reject the run before any job starts.
    pub fn run(
        &mut self,
        options: &BuildOptions,
        specifiers: &[String],
    ) -> Result<Vec<PathBuf>, BuildError> {
        let plan = discover_targets(self.context, specifiers)?;
        let jobs = plan.jobs(options)?;

        let mut tracker = ProgressTracker::new();
        tracker.start(jobs.len());
        self.reporter.report(ProgressEvent::BuildStarted { total_targets: jobs.len() });
        tracing::info!(jobs = jobs.len(), workers = self.jobs, "starting build");

        let runner = JobRunner {
            context: self.context,
            engine: self.engine,
            provider: self.provider,
            reporter: self.reporter,
            cache: Mutex::new(&mut *self.cache),
            tracker: Mutex::new(tracker),
        };
        let result = WorkerPool::new(self.jobs).run(&jobs, |_, job| runner.run(job));

        let tracker = runner.tracker.into_inner().unwrap_or_else(PoisonError::into_inner);
        self.reporter.report(tracker.build_completed_event());
        if let Err(e) = &result {
            tracing::debug!(error = %e, "build aborted");
        }
        result
    }
}

struct JobRunner<'a, E: BundleEngine> {
    context: &'a BuildContext,
    engine: &'a E,
    provider: &'a dyn ConfigProvider,
    reporter: &'a dyn ProgressReporter,
    cache: Mutex<&'a mut BundleCache<E::Graph>>,
    tracker: Mutex<ProgressTracker>,
}

impl<E: BundleEngine> JobRunner<'_, E> {
    fn run(&self, job: &Job) -> Result<PathBuf, BuildError> {
        let started = Instant::now();
        let previous = self
            .cache
            .lock()
            .map_err(|_| BuildError::Worker("bundle cache lock poisoned".to_string()))?
            .get(&job.options.input)
            .cloned();

        let options = match &previous {
            Some(entry) => entry.options.clone(),
            None => self.resolve_options(&job.options),
        };
        let name = options.name.clone().unwrap_or_else(|| job.label.clone());

        self.reporter.report(ProgressEvent::TargetStarted {
            target: name.clone(),
            input: options.input.clone(),
            cached: previous.is_some(),
        });

        let result = self.bundle(&name, options, previous.as_ref().map(|e| e.graph.as_ref()));

        let status = match &result {
            Ok(_) => TargetStatus::Success,
            Err(BuildError::Bundle { source, .. }) => TargetStatus::Failed(source.to_string()),
            Err(e) => TargetStatus::Failed(e.to_string()),
        };
        if let Ok(mut tracker) = self.tracker.lock() {
            tracker.target_completed(&status);
        }
        self.reporter.report(ProgressEvent::TargetCompleted {
            target: name,
            status,
            duration_ms: started.elapsed().as_millis() as u64,
            output: result.as_ref().ok().cloned(),
        });
        result
    }

    /// Absolute output path and bundle name for a fresh job.
    fn resolve_options(&self, options: &BuildOptions) -> BuildOptions {
        let mut options = options.clone();
        options.input = self.context.resolve_path(&options.input);
        options.output = options
            .output
            .as_deref()
            .map(|output| resolve_output(&self.context.resolve_path(output), &options.input));
        if options.name.is_none() {
            options.name = Some(derive_name(&options.input));
        }
        options
    }

    fn bundle(
        &self,
        name: &str,
        mut options: BuildOptions,
        previous: Option<&E::Graph>,
    ) -> Result<PathBuf, BuildError> {
        let pipeline = PipelineBuilder::new(self.context.project_root(), self.provider)
            .build(&options)?;
        let destination = match &pipeline.output {
            Some(output) => self.context.resolve_path(output),
            None => return Err(ConfigError::MissingOutput { input: pipeline.input }.into()),
        };
        tracing::debug!(
            name,
            input = %pipeline.input.display(),
            destination = %destination.display(),
            stages = ?pipeline.stage_names(),
            "bundling"
        );

        let resolved = self
            .engine
            .resolve(&pipeline, previous)
            .map_err(|e| BuildError::bundle(name, e))?;
        self.warn(name, &pipeline, resolved.diagnostics);

        let artifact = self
            .engine
            .write(&resolved.graph, &pipeline, &destination)
            .map_err(|e| BuildError::bundle(name, e))?;
        self.warn(name, &pipeline, artifact.diagnostics);

        options.output = Some(destination);
        self.cache
            .lock()
            .map_err(|_| BuildError::Worker("bundle cache lock poisoned".to_string()))?
            .put(options.input.clone(), Arc::new(resolved.graph), options);

        Ok(artifact.path)
    }

    fn warn(&self, name: &str, pipeline: &Pipeline, diagnostics: Vec<Diagnostic>) {
        for diagnostic in surface(diagnostics, &pipeline.suppressed) {
            self.reporter.report(ProgressEvent::Warning {
                target: Some(name.to_string()),
                message: diagnostic.message,
            });
        }
    }
}
