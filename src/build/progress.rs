//! Build progress reporting.
//!
//! The scheduler emits [`ProgressEvent`]s; reporters turn them into
//! console lines with spinners, JSON lines, or nothing at all.
//!
//! # Example
//!
//! ```ignore
//! use rna::build::progress::{ConsoleProgress, ProgressEvent, ProgressReporter, TargetStatus};
//!
//! let reporter = ConsoleProgress::new();
//! reporter.report(ProgressEvent::BuildStarted { total_targets: 1 });
//! reporter.report(ProgressEvent::TargetStarted {
//!     target: "@org/ui".to_string(),
//!     input: "packages/ui/src/index.js".into(),
//!     cached: false,
//! });
//! ```

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Status of a finished target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetStatus {
    /// Bundle written
    Success,
    /// Bundling failed
    Failed(String),
}

/// Events reported during a build.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Build started
    BuildStarted {
        /// Number of jobs in the run
        total_targets: usize,
    },
    /// A job started bundling
    TargetStarted {
        /// Target label
        target: String,
        /// Entry module
        input: PathBuf,
        /// Whether a previous graph for the input is cached
        cached: bool,
    },
    /// A job finished
    TargetCompleted {
        /// Target label
        target: String,
        /// Outcome
        status: TargetStatus,
        /// Duration in milliseconds
        duration_ms: u64,
        /// Artifact path, for successful jobs
        output: Option<PathBuf>,
    },
    /// Build finished
    BuildCompleted {
        /// Whether every job succeeded
        success: bool,
        /// Total duration in milliseconds
        duration_ms: u64,
        /// Jobs that wrote a bundle
        succeeded: usize,
        /// Jobs never started because an earlier one failed
        skipped: usize,
        /// Jobs that failed
        failed: usize,
    },
    /// A surfaced bundler warning
    Warning {
        /// Target the warning belongs to
        target: Option<String>,
        /// Warning text
        message: String,
    },
    /// An error
    Error {
        /// Target the error belongs to
        target: Option<String>,
        /// Error text
        message: String,
    },
}

/// Trait for progress reporters.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event.
    fn report(&self, event: ProgressEvent);
}

/// A progress reporter that discards all events.
#[derive(Debug, Default)]
pub struct NullProgress;

impl ProgressReporter for NullProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Console progress reporter.
///
/// On a terminal each running job shows a spinner with its start line;
/// finished jobs, warnings and the summary are printed as plain lines.
pub struct ConsoleProgress {
    use_colors: bool,
    verbose: bool,
    spinners: Option<MultiProgress>,
    active: Mutex<HashMap<String, ProgressBar>>,
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleProgress")
            .field("use_colors", &self.use_colors)
            .field("verbose", &self.verbose)
            .field("spinners", &self.spinners.is_some())
            .finish()
    }
}

impl ConsoleProgress {
    /// Create a console reporter writing to stderr.
    pub fn new() -> Self {
        Self {
            use_colors: true,
            verbose: false,
            spinners: Some(MultiProgress::new()),
            active: Mutex::new(HashMap::new()),
            output: Mutex::new(Box::new(std::io::stderr())),
        }
    }

    /// Create a console reporter writing plain lines to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self {
            use_colors: false,
            verbose: false,
            spinners: None,
            active: Mutex::new(HashMap::new()),
            output: Mutex::new(Box::new(output)),
        }
    }

    /// Set whether to use colors.
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn paint(&self, text: &str, style: fn(&str) -> colored::ColoredString) -> String {
        if self.use_colors {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn writeln(&self, line: &str) {
        let write = || {
            if let Ok(mut output) = self.output.lock() {
                let _ = writeln!(output, "{}", line);
            }
        };
        match &self.spinners {
            Some(multi) => multi.suspend(write),
            None => write(),
        }
    }

    fn start_spinner(&self, target: &str, message: String) -> bool {
        let Some(multi) = self.spinners.as_ref().filter(|m| !m.is_hidden()) else {
            return false;
        };
        let bar = multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.green} {msg}")
        {
            bar.set_style(style);
        }
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(80));
        if let Ok(mut active) = self.active.lock() {
            active.insert(target.to_string(), bar);
        }
        true
    }

    fn stop_spinner(&self, target: &str) {
        if let Ok(mut active) = self.active.lock() {
            if let Some(bar) = active.remove(target) {
                bar.finish_and_clear();
            }
        }
    }

    fn with_target(target: Option<String>, message: String) -> String {
        match target {
            Some(target) => format!("{}: {}", target, message),
            None => message,
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::BuildStarted { total_targets } => {
                if self.verbose && total_targets > 1 {
                    self.writeln(&format!("bundling {} targets...", total_targets));
                }
            }
            ProgressEvent::TargetStarted { target, input, cached } => {
                let line = format!(
                    "bundling{}... {}",
                    if cached { " [this will be fast]" } else { "" },
                    self.paint(&format!("({})", input.display()), |s| s.dimmed())
                );
                if !self.start_spinner(&target, line.clone()) {
                    self.writeln(&line);
                }
            }
            ProgressEvent::TargetCompleted { target, status, duration_ms, output } => {
                self.stop_spinner(&target);
                match status {
                    TargetStatus::Success => {
                        let artifact =
                            output.map(|p| p.display().to_string()).unwrap_or_else(|| target.clone());
                        let mut line = format!(
                            "{} {}",
                            self.paint("bundle ready!", |s| s.green().bold()),
                            self.paint(&format!("({})", artifact), |s| s.dimmed())
                        );
                        if self.verbose {
                            line.push_str(&format!(" in {}", format_duration(duration_ms)));
                        }
                        self.writeln(&line);
                    }
                    TargetStatus::Failed(message) => {
                        self.writeln(&self.paint(&format!("error bundling {}", target), |s| s.red()));
                        if self.verbose {
                            self.writeln(&format!("    {}", message));
                        }
                    }
                }
            }
            ProgressEvent::BuildCompleted { success, duration_ms, succeeded, skipped, failed } => {
                if success {
                    if self.verbose {
                        self.writeln(&format!(
                            "{} {} {} in {}",
                            self.paint("done:", |s| s.green()),
                            succeeded,
                            if succeeded == 1 { "bundle" } else { "bundles" },
                            format_duration(duration_ms)
                        ));
                    }
                } else {
                    self.writeln(&format!(
                        "{} {} bundled, {} skipped, {} {} in {}",
                        self.paint("build failed:", |s| s.red().bold()),
                        succeeded,
                        skipped,
                        failed,
                        if failed == 1 { "failure" } else { "failures" },
                        format_duration(duration_ms)
                    ));
                }
            }
            ProgressEvent::Warning { target, message } => {
                let line = Self::with_target(target, message);
                self.writeln(&self.paint(&line, |s| s.yellow()));
            }
            ProgressEvent::Error { target, message } => {
                let line = Self::with_target(target, message);
                self.writeln(&self.paint(&line, |s| s.red()));
            }
        }
    }
}

/// JSON lines progress reporter for machine-readable output.
pub struct JsonProgress {
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for JsonProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonProgress").finish()
    }
}

impl JsonProgress {
    /// Create a new JSON progress reporter writing to stderr.
    pub fn new() -> Self {
        Self { output: Mutex::new(Box::new(std::io::stderr())) }
    }

    /// Create a JSON progress reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self { output: Mutex::new(Box::new(output)) }
    }
}

impl Default for JsonProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let json = match event {
            ProgressEvent::BuildStarted { total_targets } => {
                serde_json::json!({ "event": "build_started", "total_targets": total_targets })
            }
            ProgressEvent::TargetStarted { target, input, cached } => serde_json::json!({
                "event": "target_started",
                "target": target,
                "input": input,
                "cached": cached,
            }),
            ProgressEvent::TargetCompleted { target, status, duration_ms, output } => {
                let mut json = serde_json::json!({
                    "event": "target_completed",
                    "target": target,
                    "status": match &status {
                        TargetStatus::Success => "success",
                        TargetStatus::Failed(_) => "failed",
                    },
                    "duration_ms": duration_ms,
                });
                if let Some(output) = output {
                    json["output"] = serde_json::json!(output);
                }
                if let TargetStatus::Failed(e) = status {
                    json["error"] = serde_json::json!(e);
                }
                json
            }
            ProgressEvent::BuildCompleted { success, duration_ms, succeeded, skipped, failed } => {
                serde_json::json!({
                    "event": "build_completed",
                    "success": success,
                    "duration_ms": duration_ms,
                    "succeeded": succeeded,
                    "skipped": skipped,
                    "failed": failed,
                })
            }
            ProgressEvent::Warning { target, message } => {
                serde_json::json!({ "event": "warning", "target": target, "message": message })
            }
            ProgressEvent::Error { target, message } => {
                serde_json::json!({ "event": "error", "target": target, "message": message })
            }
        };
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", json);
        }
    }
}

/// Aggregates per-run statistics for the closing [`ProgressEvent::BuildCompleted`].
#[derive(Debug, Default)]
pub struct ProgressTracker {
    start_time: Option<Instant>,
    total: usize,
    succeeded: usize,
    failed: usize,
}

impl ProgressTracker {
    /// Create a new progress tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a run of `total_targets` jobs.
    pub fn start(&mut self, total_targets: usize) {
        self.start_time = Some(Instant::now());
        self.total = total_targets;
        self.succeeded = 0;
        self.failed = 0;
    }

    /// Record a finished job.
    pub fn target_completed(&mut self, status: &TargetStatus) {
        match status {
            TargetStatus::Success => self.succeeded += 1,
            TargetStatus::Failed(_) => self.failed += 1,
        }
    }

    /// Elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time.map(|t| t.elapsed()).unwrap_or(Duration::ZERO).as_millis() as u64
    }

    /// Jobs that never finished.
    pub fn skipped(&self) -> usize {
        self.total.saturating_sub(self.succeeded + self.failed)
    }

    /// Number of successful jobs.
    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    /// Number of failed jobs.
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Whether no job failed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Generate a BuildCompleted event from current state.
    pub fn build_completed_event(&self) -> ProgressEvent {
        ProgressEvent::BuildCompleted {
            success: self.is_success(),
            duration_ms: self.elapsed_ms(),
            succeeded: self.succeeded,
            skipped: self.skipped(),
            failed: self.failed,
        }
    }
}

/// Format a duration in milliseconds to a human-readable string.
pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let minutes = ms / 60_000;
        let seconds = (ms % 60_000) / 1000;
        format!("{}m {}s", minutes, seconds)
    }
}
