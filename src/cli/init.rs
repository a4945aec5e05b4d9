//! Init command implementation

use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_SUCCESS};
use crate::init::{ensure_editorconfig, EditorConfigStatus};

/// Run the init command
pub fn run_init(path: Option<&Path>) -> ExitCode {
    let project_path = match path {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    match ensure_editorconfig(&project_path) {
        Ok((file, status)) => {
            let message = match status {
                EditorConfigStatus::Created => ".editorconfig created.",
                EditorConfigStatus::Found => ".editorconfig found.",
            };
            println!("{} {}", message.green(), format!("({})", file.display()).dimmed());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
