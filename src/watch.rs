//! Watch mode for automatic rebuilds on file changes
//!
//! Provides file system watching with debouncing for `rna build --watch`.
//! The whole session shares one [`BundleCache`], so every rebuild hands the
//! engine the graph of the previous build of each input.

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;
use thiserror::Error;

use crate::build::{
    BuildContext, BuildError, BuildOptions, BundleCache, BundleEngine, ProgressEvent,
    ProgressReporter, Scheduler,
};
use crate::config::{ConfigProvider, WatchConfig};

/// Directories whose changes never trigger a rebuild.
const IGNORED_DIRS: &[&str] = &["node_modules", ".git"];

/// Error during watch mode
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WatchError {
    /// Failed to initialize file watcher
    #[error("Failed to initialize file watcher: {0}")]
    WatcherInit(#[source] notify::Error),
    /// Failed to add watch path
    #[error("Failed to watch path: {0}")]
    WatchPath(#[source] notify::Error),
    /// Channel receive error
    #[error("Watch channel error: {0}")]
    ChannelError(String),
    /// The first build failed on invalid targets or configuration
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// State kept across the rebuilds of one watch session.
pub struct WatchSession<'a, E: BundleEngine> {
    context: &'a BuildContext,
    engine: &'a E,
    provider: Option<&'a dyn ConfigProvider>,
    reporter: &'a dyn ProgressReporter,
    options: BuildOptions,
    specifiers: Vec<String>,
    cache: BundleCache<E::Graph>,
    outputs: Vec<PathBuf>,
    failing: bool,
}

impl<'a, E: BundleEngine> WatchSession<'a, E> {
    /// Create a session building `specifiers` with `options`.
    pub fn new(
        context: &'a BuildContext,
        engine: &'a E,
        reporter: &'a dyn ProgressReporter,
        options: BuildOptions,
        specifiers: Vec<String>,
    ) -> Self {
        Self {
            context,
            engine,
            provider: None,
            reporter,
            options,
            specifiers,
            cache: BundleCache::new(),
            outputs: Vec::new(),
            failing: false,
        }
    }

    /// Set the configuration provider.
    pub fn with_provider(mut self, provider: &'a dyn ConfigProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Run one build against the session cache.
    pub fn rebuild(&mut self) -> Result<Vec<PathBuf>, BuildError> {
        let mut scheduler =
            Scheduler::new(self.context, self.engine, &mut self.cache).with_reporter(self.reporter);
        if let Some(provider) = self.provider {
            scheduler = scheduler.with_provider(provider);
        }
        let result = scheduler.run(&self.options, &self.specifiers);

        match &result {
            Ok(outputs) => {
                if self.failing {
                    println!("[{}] Fixed: build is passing again", timestamp());
                }
                self.failing = false;
                for output in outputs {
                    if !self.outputs.contains(output) {
                        self.outputs.push(output.clone());
                    }
                }
            }
            Err(_) => self.failing = true,
        }
        result
    }

    /// Whether a change to `path` should trigger a rebuild.
    ///
    /// Artifacts written by this session and anything under `node_modules`
    /// or `.git` are ignored.
    pub fn is_relevant_change(&self, path: &Path) -> bool {
        if self.outputs.iter().any(|output| path == output || path == output.with_extension("css"))
        {
            return false;
        }
        !path.components().any(|c| IGNORED_DIRS.iter().any(|dir| c.as_os_str() == *dir))
    }

    fn report_failure(&self, error: &BuildError) {
        tracing::debug!(error = %error, "build failed while watching");
        self.reporter.report(ProgressEvent::Error { target: None, message: error.to_string() });
    }

    /// The session cache.
    pub fn cache(&self) -> &BundleCache<E::Graph> {
        &self.cache
    }

    /// Whether the last build failed.
    pub fn is_failing(&self) -> bool {
        self.failing
    }
}

/// Clear the terminal screen
fn clear_screen() {
    // ANSI escape code to clear screen and move cursor to top-left
    print!("\x1B[2J\x1B[1;1H");
}

/// Get current timestamp for logging
fn timestamp() -> String {
    use std::time::SystemTime;
    let now = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
    let secs = now.as_secs() % 86400; // seconds since midnight
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Build once, then rebuild on every relevant change under the project root.
///
/// This function blocks and runs until interrupted (Ctrl+C). A failing
/// rebuild is reported and watching continues; only a first build rejected
/// for invalid targets or configuration ends the session.
pub fn watch_and_rebuild<E: BundleEngine>(
    mut session: WatchSession<'_, E>,
    config: &WatchConfig,
) -> Result<(), WatchError> {
    let root = session.context.project_root().to_path_buf();

    let (tx, rx) = channel();
    let debounce_duration = Duration::from_millis(u64::from(config.debounce_ms));
    let mut debouncer = new_debouncer(debounce_duration, tx).map_err(WatchError::WatcherInit)?;
    debouncer.watcher().watch(&root, RecursiveMode::Recursive).map_err(WatchError::WatchPath)?;

    if config.clear_screen {
        clear_screen();
    }
    match session.rebuild() {
        Err(e @ BuildError::Config(_)) => return Err(e.into()),
        Err(e) => session.report_failure(&e),
        Ok(_) => {}
    }
    println!("[{}] Watching {} for changes...", timestamp(), root.display());

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let changed: Vec<_> = events
                    .iter()
                    .filter(|e| {
                        matches!(e.kind, DebouncedEventKind::Any)
                            && session.is_relevant_change(&e.path)
                    })
                    .collect();
                if changed.is_empty() {
                    continue;
                }

                if config.clear_screen {
                    clear_screen();
                }
                for event in &changed {
                    let shown = event.path.strip_prefix(&root).unwrap_or(&event.path);
                    println!("[{}] Changed: {}", timestamp(), shown.display());
                }
                if let Err(e) = session.rebuild() {
                    session.report_failure(&e);
                }
                println!("[{}] Watching {} for changes...", timestamp(), root.display());
            }
            Ok(Err(error)) => {
                // Watch error (non-fatal) - log but continue watching
                eprintln!("[{}] Watch error: {:?}", timestamp(), error);
            }
            Err(e) => {
                return Err(WatchError::ChannelError(e.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{Artifact, EngineError, NullProgress, Pipeline, Resolved};
    use crate::config::{default_config, NoOverride};
    use std::fs;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct CountingEngine {
        reused: AtomicUsize,
        broken: AtomicBool,
    }

    impl BundleEngine for CountingEngine {
        type Graph = ();

        fn resolve(
            &self,
            pipeline: &Pipeline,
            previous: Option<&()>,
        ) -> Result<Resolved<()>, EngineError> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(EngineError::Resolve {
                    input: pipeline.input.clone(),
                    message: "syntax error".to_string(),
                });
            }
            if previous.is_some() {
                self.reused.fetch_add(1, Ordering::SeqCst);
            }
            Ok(Resolved { graph: (), diagnostics: Vec::new() })
        }

        fn write(
            &self,
            _graph: &(),
            _pipeline: &Pipeline,
            destination: &Path,
        ) -> Result<Artifact, EngineError> {
            fs::create_dir_all(destination.parent().unwrap())?;
            fs::write(destination, "bundle")?;
            Ok(Artifact { path: destination.to_path_buf(), diagnostics: Vec::new() })
        }
    }

    fn project() -> (TempDir, BuildContext) {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("package.json"), "{}").unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/index.js"), "").unwrap();
        let ctx = BuildContext::new(default_config(), temp.path().to_path_buf());
        (temp, ctx)
    }

    #[test]
    fn test_rebuild_reuses_session_cache() {
        let (temp, ctx) = project();
        let engine = CountingEngine::default();
        let options = BuildOptions::new().with_output("dist");
        let mut session =
            WatchSession::new(&ctx, &engine, &NullProgress, options, vec!["src/index.js".to_string()])
                .with_provider(&NoOverride);

        session.rebuild().unwrap();
        session.rebuild().unwrap();

        assert_eq!(engine.reused.load(Ordering::SeqCst), 1);
        assert!(session.cache().contains(&temp.path().join("src/index.js")));
    }

    #[test]
    fn test_outputs_and_ignored_dirs_are_not_relevant() {
        let (temp, ctx) = project();
        let engine = CountingEngine::default();
        let options = BuildOptions::new().with_output("dist/app.js");
        let mut session =
            WatchSession::new(&ctx, &engine, &NullProgress, options, vec!["src/index.js".to_string()])
                .with_provider(&NoOverride);
        session.rebuild().unwrap();

        assert!(!session.is_relevant_change(&temp.path().join("dist/app.js")));
        assert!(!session.is_relevant_change(&temp.path().join("dist/app.css")));
        assert!(!session.is_relevant_change(&temp.path().join("node_modules/x/index.js")));
        assert!(session.is_relevant_change(&temp.path().join("src/index.js")));
    }

    #[test]
    fn test_failing_rebuild_keeps_session() {
        let (_temp, ctx) = project();
        let engine = CountingEngine::default();
        let options = BuildOptions::new().with_output("dist");
        let mut session =
            WatchSession::new(&ctx, &engine, &NullProgress, options, vec!["src/index.js".to_string()])
                .with_provider(&NoOverride);

        engine.broken.store(true, Ordering::SeqCst);
        assert!(matches!(session.rebuild(), Err(BuildError::Bundle { .. })));
        assert!(session.is_failing());

        engine.broken.store(false, Ordering::SeqCst);
        session.rebuild().unwrap();
        assert!(!session.is_failing());
    }

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp();
        assert_eq!(ts.len(), 8);
        assert_eq!(&ts[2..3], ":");
        assert_eq!(&ts[5..6], ":");
    }
}
