//! Build command implementation

use colored::Colorize;
use std::process::ExitCode;

use super::{BuildArgs, EXIT_ERROR, EXIT_SUCCESS};
use crate::build::{
    BuildContext, BuildError, BuildOptions, BundleCache, CommandEngine, ConsoleProgress,
    JsonProgress, ProgressReporter, Scheduler, SourceMap,
};
use crate::config::{merge_cli_overrides, CliOverrides};
use crate::watch::{watch_and_rebuild, WatchSession};

/// Translate command-line arguments into job options.
fn build_options(args: &BuildArgs) -> BuildOptions {
    let mut options = BuildOptions::new()
        .with_sourcemap(SourceMap::from_flag(args.map))
        .with_production(args.production)
        .with_external_css(args.external_css)
        .with_verbose(args.verbose);
    if let Some(output) = &args.output {
        options = options.with_output(output);
    }
    if let Some(name) = &args.name {
        options = options.with_name(name);
    }
    options
}

/// Message shown for a failed run; bundle failures were already announced
/// by the reporter, so only their cause is printed.
fn failure_message(error: &BuildError) -> String {
    match error {
        BuildError::Bundle { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}

/// Run the build command
pub fn run_build(args: &BuildArgs) -> ExitCode {
    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut context = match BuildContext::discover(&cwd) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("{}", e.to_string().red());
            return ExitCode::from(EXIT_ERROR);
        }
    };
    merge_cli_overrides(
        context.config_mut(),
        &CliOverrides { jobs: args.jobs, ..Default::default() },
    );

    let engine = CommandEngine::from_settings(&context.config().build, context.project_root());
    let reporter: Box<dyn ProgressReporter> = if args.json {
        Box::new(JsonProgress::new())
    } else {
        Box::new(
            ConsoleProgress::new()
                .with_colors(colored::control::SHOULD_COLORIZE.should_colorize())
                .with_verbose(args.verbose),
        )
    };
    let options = build_options(args);

    if args.watch {
        let watch_config = context.config().watch.clone();
        let session = WatchSession::new(
            &context,
            &engine,
            reporter.as_ref(),
            options,
            args.specifiers.clone(),
        );
        println!("Starting watch mode...");
        println!("Press Ctrl+C to stop");
        return match watch_and_rebuild(session, &watch_config) {
            Ok(()) => ExitCode::from(EXIT_SUCCESS),
            Err(e) => {
                eprintln!("{}", e.to_string().red());
                ExitCode::from(EXIT_ERROR)
            }
        };
    }

    let mut cache = BundleCache::new();
    let result = Scheduler::new(&context, &engine, &mut cache)
        .with_reporter(reporter.as_ref())
        .run(&options, &args.specifiers);

    match result {
        Ok(outputs) => {
            for output in outputs {
                println!("{}", output.display());
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("{}", failure_message(&e).red());
            ExitCode::from(EXIT_ERROR)
        }
    }
}
