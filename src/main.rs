//! RNA - command-line bundler orchestrator for JavaScript workspaces

use std::process::ExitCode;

use rna::cli;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `RNA_LOG=rna=debug`.
const LOG_ENV: &str = "RNA_LOG";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    cli::run()
}
