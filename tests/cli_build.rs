//! CLI integration tests for the `rna build` and `rna init` commands.
//!
//! Runs the binary against temporary projects. Covers project discovery
//! errors, target validation messages, the editorconfig block, and a full
//! build through a shell stand-in for the bundler.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get a command for the rna binary running in `dir`.
fn rna(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rna").unwrap();
    cmd.current_dir(dir).env_remove("RNA_LOG");
    cmd
}

/// Create a file with content, creating parent directories.
fn create_test_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// A project with a root package and one source file.
fn create_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "package.json", r#"{"name": "demo", "main": "index.js"}"#);
    create_test_file(temp.path(), "index.js", "export default 1;\n");
    create_test_file(temp.path(), "src/app.js", "export const app = 1;\n");
    temp
}

// ============================================================================
// Help Tests
// ============================================================================

#[test]
fn test_help_lists_commands() {
    let temp = TempDir::new().unwrap();
    rna(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn test_build_help_lists_options() {
    let temp = TempDir::new().unwrap();
    rna(temp.path())
        .args(["build", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--output"))
        .stdout(predicate::str::contains("--production"))
        .stdout(predicate::str::contains("--watch"));
}

// ============================================================================
// Build Error Tests
// ============================================================================

#[test]
fn test_build_without_project() {
    let temp = TempDir::new().unwrap();
    rna(temp.path())
        .arg("build")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no project found."));
}

#[test]
fn test_build_file_without_output() {
    let temp = create_project();
    rna(temp.path())
        .args(["build", "src/app.js"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing 'output' option for"))
        .stderr(predicate::str::contains("app.js"));
}

#[test]
fn test_build_package_without_main() {
    let temp = create_project();
    create_test_file(
        temp.path(),
        "packages/lib/package.json",
        r#"{"name": "lib", "module": "src/index.js"}"#,
    );
    create_test_file(temp.path(), "packages/lib/src/index.js", "");

    rna(temp.path())
        .args(["build", "lib"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing 'output' property for lib module."));
}

#[test]
fn test_build_unknown_target() {
    let temp = create_project();
    rna(temp.path())
        .args(["build", "nothing-here"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nothing-here"));
}

#[test]
fn test_build_invalid_rna_toml() {
    let temp = create_project();
    create_test_file(temp.path(), "rna.toml", "[build\n");
    rna(temp.path())
        .args(["build", "src/app.js", "-o", "dist"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("rna.toml"));
}

#[test]
fn test_build_missing_bundler() {
    let temp = create_project();
    create_test_file(
        temp.path(),
        "rna.toml",
        "[build]\nbundler = \"rna-test-bundler-that-does-not-exist\"\n",
    );
    rna(temp.path())
        .args(["build", "src/app.js", "-o", "dist"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to start bundler"));
    assert!(!temp.path().join("dist/app.js").exists());
}

// ============================================================================
// Build Tests
// ============================================================================

#[cfg(unix)]
fn configure_shell_bundler(dir: &Path) {
    create_test_file(
        dir,
        "rna.toml",
        "[build]\nbundler = \"sh\"\nbundler_args = [\"-c\", \"cat > \\\"$RNA_OUTPUT\\\"\"]\n",
    );
}

#[cfg(unix)]
#[test]
fn test_build_file_with_shell_bundler() {
    let temp = create_project();
    configure_shell_bundler(temp.path());

    let output = rna(temp.path())
        .args(["build", "src/app.js", "-o", "dist", "--production"])
        .assert()
        .success()
        .stderr(predicate::str::contains("bundle ready!"))
        .get_output()
        .stdout
        .clone();

    let artifact = temp.path().join("dist/app.js");
    assert!(String::from_utf8_lossy(&output).contains("app.js"));
    let payload: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&artifact).unwrap()).unwrap();
    assert_eq!(payload["pipeline"]["name"], "App");
    assert_eq!(payload["pipeline"]["format"], "umd");
    let stages = payload["pipeline"]["stages"].as_array().unwrap();
    assert_eq!(stages.last().unwrap()["stage"], "minify");
}

#[cfg(unix)]
#[test]
fn test_build_json_progress() {
    let temp = create_project();
    configure_shell_bundler(temp.path());

    rna(temp.path())
        .args(["build", "src/app.js", "-o", "dist", "--json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("\"event\":\"build_started\""))
        .stderr(predicate::str::contains("\"event\":\"build_completed\""));
}

// ============================================================================
// Init Tests
// ============================================================================

#[test]
fn test_init_creates_then_finds_editorconfig() {
    let temp = TempDir::new().unwrap();

    rna(temp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains(".editorconfig created."));
    let contents = fs::read_to_string(temp.path().join(".editorconfig")).unwrap();
    assert!(contents.contains("# RNA"));

    rna(temp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains(".editorconfig found."));
    let again = fs::read_to_string(temp.path().join(".editorconfig")).unwrap();
    assert_eq!(contents, again);
}

#[test]
fn test_init_missing_directory() {
    let temp = TempDir::new().unwrap();
    rna(temp.path()).args(["init", "does/not/exist"]).assert().code(1);
}
