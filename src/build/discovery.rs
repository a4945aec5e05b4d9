//! Target discovery.
//!
//! Turns command-line specifiers into a [`BuildPlan`]:
//!
//! - no specifiers: the project root package
//! - glob patterns: matching files and package directories, with `{a,b}`
//!   alternatives expanded before matching
//! - existing files and package directories
//! - otherwise a package name, looked up among the root package and the
//!   workspace packages under `packages/*`

use crate::build::{BuildContext, BuildPlan, FileTarget, PackageTarget, Target};
use crate::config::{load_manifest, ConfigError, MANIFEST_FILE};
use glob::glob;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use sugar_path::SugarPath;

/// Directory holding workspace packages, relative to the project root.
pub const PACKAGES_DIR: &str = "packages";

/// Whether a specifier is a glob pattern.
pub fn is_pattern(specifier: &str) -> bool {
    specifier.contains(['*', '?', '[', '{'])
}

fn is_package_dir(path: &Path) -> bool {
    path.is_dir() && path.join(MANIFEST_FILE).is_file()
}

/// Load the package rooted at `dir`.
pub fn load_package(dir: &Path) -> Result<PackageTarget, ConfigError> {
    let manifest = load_manifest(dir)?;
    Ok(PackageTarget::new(dir.to_path_buf(), manifest))
}

/// The root package followed by every package under `packages/*`.
pub fn workspace_packages(project_root: &Path) -> Result<Vec<PackageTarget>, ConfigError> {
    let mut packages = vec![load_package(project_root)?];

    let pattern = project_root.join(PACKAGES_DIR).join("*");
    let pattern = pattern.to_string_lossy();
    let entries = glob(&pattern).map_err(|e| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    for entry in entries {
        match entry {
            Ok(dir) if is_package_dir(&dir) => packages.push(load_package(&dir)?),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "skipping unreadable workspace entry"),
        }
    }
    Ok(packages)
}

/// Expand `{a,b}` alternatives, which `glob` does not understand.
///
/// Nested groups are expanded recursively; a `{` without a matching `}` is
/// left for `glob` to reject.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };

    let mut depth = 0;
    let mut close = None;
    let mut splits = Vec::new();
    for (i, c) in pattern[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(open + i);
                    break;
                }
            }
            ',' if depth == 1 => splits.push(open + i),
            _ => {}
        }
    }
    let Some(close) = close else {
        return vec![pattern.to_string()];
    };

    let head = &pattern[..open];
    let tail = &pattern[close + 1..];
    let mut bounds = vec![open];
    bounds.extend(splits);
    bounds.push(close);

    let mut expanded = Vec::new();
    for pair in bounds.windows(2) {
        let alternative = &pattern[pair[0] + 1..pair[1]];
        for rest in expand_braces(&format!("{head}{alternative}{tail}")) {
            if !expanded.contains(&rest) {
                expanded.push(rest);
            }
        }
    }
    expanded
}

fn expand_pattern(base: &Path, specifier: &str) -> Result<Vec<Target>, ConfigError> {
    let pattern = if Path::new(specifier).is_absolute() {
        PathBuf::from(specifier)
    } else {
        base.join(specifier)
    };
    let pattern = pattern.normalize();
    let pattern = pattern.to_string_lossy();

    let mut seen = BTreeSet::new();
    let mut targets = Vec::new();
    for alternative in expand_braces(&pattern) {
        let entries = glob(&alternative).map_err(|e| ConfigError::InvalidPattern {
            pattern: specifier.to_string(),
            message: e.to_string(),
        })?;
        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable path");
                    continue;
                }
            };
            if !seen.insert(path.clone()) {
                continue;
            }
            if path.is_file() {
                targets.push(Target::File(FileTarget::new(path)));
            } else if is_package_dir(&path) {
                targets.push(Target::Package(load_package(&path)?));
            }
        }
    }
    Ok(targets)
}

fn resolve_specifier(
    context: &BuildContext,
    specifier: &str,
    workspace: &mut Option<Vec<PackageTarget>>,
) -> Result<Vec<Target>, ConfigError> {
    let base = context.working_dir();

    if is_pattern(specifier) {
        let targets = expand_pattern(base, specifier)?;
        if targets.is_empty() {
            return Err(ConfigError::UnknownTarget { specifier: specifier.to_string() });
        }
        return Ok(targets);
    }

    let path = base.join(specifier).normalize();
    if path.is_file() {
        return Ok(vec![Target::File(FileTarget::new(path))]);
    }
    if is_package_dir(&path) {
        return Ok(vec![Target::Package(load_package(&path)?)]);
    }

    if workspace.is_none() {
        *workspace = Some(workspace_packages(context.project_root())?);
    }
    let found = workspace.iter().flatten().find(|pkg| {
        pkg.name == specifier
            || pkg.path.file_name().map(|n| n.to_string_lossy() == specifier).unwrap_or(false)
    });
    match found {
        Some(pkg) => Ok(vec![Target::Package(pkg.clone())]),
        None => Err(ConfigError::UnknownTarget { specifier: specifier.to_string() }),
    }
}

/// Resolve specifiers into a build plan.
pub fn discover_targets(
    context: &BuildContext,
    specifiers: &[String],
) -> Result<BuildPlan, ConfigError> {
    let mut plan = BuildPlan::new();

    if specifiers.is_empty() {
        plan.add(Target::Package(load_package(context.project_root())?));
        return Ok(plan);
    }

    let mut workspace = None;
    for specifier in specifiers {
        for target in resolve_specifier(context, specifier, &mut workspace)? {
            plan.add(target);
        }
    }

    tracing::debug!(
        packages = plan.packages().len(),
        files = plan.files().len(),
        "discovered targets"
    );
    Ok(plan)
}
