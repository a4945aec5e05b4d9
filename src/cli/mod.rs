//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod build;
mod init;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;

/// RNA - bundle the packages and entry files of a JavaScript workspace
#[derive(Parser)]
#[command(name = "rna")]
#[command(about = "RNA - bundle the packages and entry files of a JavaScript workspace")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bundle packages and entry files
    Build(BuildArgs),

    /// Add the tool's settings to the project's .editorconfig
    Init {
        /// Project directory (default: current directory)
        path: Option<PathBuf>,
    },
}

/// Arguments of `rna build`.
#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Files, glob patterns, package directories or package names.
    /// With none, the package at the project root is built.
    pub specifiers: Vec<String>,

    /// Output file, or directory when the last segment has no extension
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Global name of the bundle (default: derived from the entry file)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Generate source maps (--map=false to disable)
    #[arg(
        long,
        default_value_t = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        action = clap::ArgAction::Set
    )]
    pub map: bool,

    /// Minify the bundles
    #[arg(long)]
    pub production: bool,

    /// Extract stylesheets next to the bundle instead of inlining them
    #[arg(long)]
    pub external_css: bool,

    /// Show every bundler warning and per-bundle timings
    #[arg(short, long)]
    pub verbose: bool,

    /// Number of bundles built at the same time (default: rna.toml, or 1)
    #[arg(short, long, value_parser = clap::value_parser!(usize))]
    pub jobs: Option<usize>,

    /// Rebuild whenever a file under the project root changes
    #[arg(short, long)]
    pub watch: bool,

    /// Emit progress as JSON lines on stderr
    #[arg(long)]
    pub json: bool,
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build(args) => build::run_build(&args),
        Commands::Init { path } => init::run_init(path.as_deref()),
    }
}
