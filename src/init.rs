//! Project initialization
//!
//! `rna init` makes sure the project's `.editorconfig` carries the tool's
//! settings. They live in a block delimited by `# RNA` marker lines, so the
//! rest of the file is left alone and running the command again only
//! refreshes the block.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Marker line opening and closing the managed block.
pub const BLOCK_MARKER: &str = "# RNA";

/// Name of the EditorConfig file.
pub const EDITORCONFIG_FILE: &str = ".editorconfig";

/// Settings written inside the managed block.
pub const EDITORCONFIG_TEMPLATE: &str = "\
root = true

[*]
charset = utf-8
end_of_line = lf
indent_style = space
indent_size = 4
insert_final_newline = true
trim_trailing_whitespace = true

[*.md]
trim_trailing_whitespace = false

[{package.json,*.yml}]
indent_size = 2
";

/// Error during project initialization
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InitError {
    /// Target directory does not exist
    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    /// Failed to read or write the configuration file
    #[error("failed to update {}: {source}", .path.display())]
    Io {
        /// File being updated
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Whether `.editorconfig` existed before initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorConfigStatus {
    /// The file was created
    Created,
    /// The file existed and its block was refreshed
    Found,
}

/// Replace the managed block in `existing` with `content`, or append it.
///
/// An unterminated block runs to the end of the file.
pub fn merge_block(existing: &str, content: &str) -> String {
    let block = format!("{marker}\n{}\n{marker}\n", content.trim_end(), marker = BLOCK_MARKER);

    let lines: Vec<&str> = existing.lines().collect();
    let start = lines.iter().position(|l| l.trim_end() == BLOCK_MARKER);
    let Some(start) = start else {
        if existing.trim().is_empty() {
            return block;
        }
        return format!("{}\n\n{}", existing.trim_end(), block);
    };
    let end = lines[start + 1..]
        .iter()
        .position(|l| l.trim_end() == BLOCK_MARKER)
        .map(|offset| start + 1 + offset + 1)
        .unwrap_or(lines.len());

    let mut merged = String::new();
    for line in &lines[..start] {
        merged.push_str(line);
        merged.push('\n');
    }
    merged.push_str(&block);
    for line in &lines[end..] {
        merged.push_str(line);
        merged.push('\n');
    }
    merged
}

/// Ensure `dir/.editorconfig` contains the managed block.
///
/// # Returns
/// The file path and whether it was created or already present.
pub fn ensure_editorconfig(dir: &Path) -> Result<(PathBuf, EditorConfigStatus), InitError> {
    if !dir.is_dir() {
        return Err(InitError::DirectoryNotFound(dir.to_path_buf()));
    }
    let path = dir.join(EDITORCONFIG_FILE);
    let io_err = |source| InitError::Io { path: path.clone(), source };

    let (existing, status) = if path.is_file() {
        (fs::read_to_string(&path).map_err(io_err)?, EditorConfigStatus::Found)
    } else {
        (String::new(), EditorConfigStatus::Created)
    };

    let merged = merge_block(&existing, EDITORCONFIG_TEMPLATE);
    if merged != existing {
        fs::write(&path, merged).map_err(io_err)?;
    }
    tracing::debug!(path = %path.display(), ?status, "editorconfig ready");
    Ok((path, status))
}
