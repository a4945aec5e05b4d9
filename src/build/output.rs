//! Output path resolution.

use std::path::{Path, PathBuf};

/// Resolve the artifact path for `input` given the requested `output`.
///
/// An output whose final segment contains no `.` names a directory, and
/// the input's file name is appended to it. Anything else is already a file
/// path and is returned unchanged.
pub fn resolve_output(output: &Path, input: &Path) -> PathBuf {
    let names_file =
        output.file_name().map(|name| name.to_string_lossy().contains('.')).unwrap_or(false);
    if names_file {
        return output.to_path_buf();
    }
    match input.file_name() {
        Some(file_name) => output.join(file_name),
        None => output.to_path_buf(),
    }
}

/// Path of the stylesheet extracted next to `output`: same directory and
/// stem, `.css` extension.
pub fn stylesheet_path(output: &Path) -> PathBuf {
    output.with_extension("css")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_output_gets_input_file_name() {
        assert_eq!(
            resolve_output(Path::new("/dist"), Path::new("/src/a.js")),
            PathBuf::from("/dist/a.js")
        );
    }

    #[test]
    fn test_file_output_is_unchanged() {
        assert_eq!(
            resolve_output(Path::new("/dist/out.js"), Path::new("/anything.js")),
            PathBuf::from("/dist/out.js")
        );
    }

    #[test]
    fn test_trailing_separator_is_a_directory() {
        assert_eq!(
            resolve_output(Path::new("/dist/"), Path::new("/src/index.jsx")),
            PathBuf::from("/dist/index.jsx")
        );
    }

    #[test]
    fn test_dotted_directory_segment_counts_as_file() {
        assert_eq!(
            resolve_output(Path::new("/build/v1.2"), Path::new("/src/a.js")),
            PathBuf::from("/build/v1.2")
        );
    }

    #[test]
    fn test_dotfile_output_counts_as_file() {
        assert_eq!(
            resolve_output(Path::new("/dist/.bundle"), Path::new("/src/a.js")),
            PathBuf::from("/dist/.bundle")
        );
    }

    #[test]
    fn test_stylesheet_path() {
        assert_eq!(stylesheet_path(Path::new("/dist/app.min.js")), PathBuf::from("/dist/app.min.css"));
        assert_eq!(stylesheet_path(Path::new("/dist/app.js")), PathBuf::from("/dist/app.css"));
    }
}
