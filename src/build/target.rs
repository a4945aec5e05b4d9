//! Build target definitions.
//!
//! A target is either a workspace package, whose entry and artifact come
//! from its `package.json`, or a single entry file. Every target becomes
//! exactly one bundling job.

use crate::build::naming::camelize;
use crate::build::BuildOptions;
use crate::config::{resolve_path, ConfigError, PackageManifest};
use std::path::{Path, PathBuf};

/// A package target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageTarget {
    /// Package name from the manifest, or the directory name
    pub name: String,
    /// Package directory
    pub path: PathBuf,
    /// Parsed manifest
    pub manifest: PackageManifest,
}

impl PackageTarget {
    /// Create a package target.
    pub fn new(path: PathBuf, manifest: PackageManifest) -> Self {
        let name = if manifest.name.is_empty() {
            path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
        } else {
            manifest.name.clone()
        };
        Self { name, path, manifest }
    }

    /// Whether the package can be built with the given options.
    ///
    /// A package needs a `main` entry unless an explicit output is given.
    pub fn check(&self, base: &BuildOptions) -> Result<(), ConfigError> {
        if self.manifest.main.is_none() && base.output.is_none() {
            return Err(ConfigError::MissingMain { package: self.name.clone() });
        }
        if self.manifest.main.is_none() && self.manifest.module.is_none() {
            return Err(ConfigError::MissingMain { package: self.name.clone() });
        }
        Ok(())
    }

    /// Job options for this package.
    ///
    /// With a `module` entry the module is bundled into `main`. Without one
    /// `main` itself is the entry and the explicit output is the artifact.
    pub fn job_options(&self, base: &BuildOptions) -> Result<BuildOptions, ConfigError> {
        self.check(base)?;

        let mut options = base.clone();
        match (&self.manifest.module, &self.manifest.main) {
            (Some(module), Some(main)) => {
                options.input = self.path.join(module);
                options.output = Some(self.path.join(main));
            }
            (Some(module), None) => {
                options.input = self.path.join(module);
            }
            (None, Some(main)) => {
                options.input = self.path.join(main);
            }
            (None, None) => {
                return Err(ConfigError::MissingMain { package: self.name.clone() });
            }
        }
        options.name = Some(camelize(&self.name));
        Ok(options)
    }
}

/// A single entry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTarget {
    /// Absolute path of the entry
    pub path: PathBuf,
}

impl FileTarget {
    /// Create a file target.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Job options for this file.
    ///
    /// When several files share one explicit output, a relative output is
    /// taken relative to each file's own directory.
    pub fn job_options(&self, base: &BuildOptions, shared_output: bool) -> BuildOptions {
        let mut options = base.clone();
        options.input = self.path.clone();
        if shared_output {
            if let Some(output) = &base.output {
                let dir = self.path.parent().unwrap_or_else(|| Path::new("/"));
                options.output = Some(resolve_path(dir, output));
            }
        }
        options
    }
}

/// A target of either kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Workspace package
    Package(PackageTarget),
    /// Entry file
    File(FileTarget),
}

impl Target {
    /// Label used in progress output.
    pub fn label(&self) -> String {
        match self {
            Target::Package(pkg) => pkg.name.clone(),
            Target::File(file) => file.path.display().to_string(),
        }
    }
}

/// One bundling job: a label for reporting and the options to build with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Target label
    pub label: String,
    /// Options with the input filled in
    pub options: BuildOptions,
}

/// Ordered set of targets for one run: packages first, then files, each in
/// discovery order with duplicates dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildPlan {
    packages: Vec<PackageTarget>,
    files: Vec<FileTarget>,
}

impl BuildPlan {
    /// Create an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target, ignoring one already present at the same path.
    pub fn add(&mut self, target: Target) {
        match target {
            Target::Package(pkg) => {
                if !self.packages.iter().any(|p| p.path == pkg.path) {
                    self.packages.push(pkg);
                }
            }
            Target::File(file) => {
                if !self.files.iter().any(|f| f.path == file.path) {
                    self.files.push(file);
                }
            }
        }
    }

    /// Package targets.
    pub fn packages(&self) -> &[PackageTarget] {
        &self.packages
    }

    /// File targets.
    pub fn files(&self) -> &[FileTarget] {
        &self.files
    }

    /// All targets in execution order.
    pub fn targets(&self) -> Vec<Target> {
        self.packages
            .iter()
            .cloned()
            .map(Target::Package)
            .chain(self.files.iter().cloned().map(Target::File))
            .collect()
    }

    /// Number of targets.
    pub fn len(&self) -> usize {
        self.packages.len() + self.files.len()
    }

    /// Whether the plan is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Turn the plan into jobs, validating every target first.
    ///
    /// Any package that cannot be built rejects the whole plan, so nothing
    /// is built when one target is misconfigured.
    pub fn jobs(&self, base: &BuildOptions) -> Result<Vec<Job>, ConfigError> {
        for pkg in &self.packages {
            pkg.check(base)?;
        }

        let shared_output = self.files.len() > 1;
        let mut jobs = Vec::with_capacity(self.len());
        for pkg in &self.packages {
            jobs.push(Job { label: pkg.name.clone(), options: pkg.job_options(base)? });
        }
        for file in &self.files {
            jobs.push(Job {
                label: file.path.display().to_string(),
                options: file.job_options(base, shared_output),
            });
        }
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(name: &str, main: Option<&str>, module: Option<&str>) -> PackageManifest {
        PackageManifest {
            name: name.to_string(),
            main: main.map(String::from),
            module: module.map(String::from),
        }
    }

    #[test]
    fn test_package_with_module_builds_into_main() {
        let pkg = PackageTarget::new(
            PathBuf::from("/p/packages/ui"),
            manifest("@org/ui-kit", Some("dist/ui.js"), Some("src/index.js")),
        );
        let options = pkg.job_options(&BuildOptions::new().with_name("Ignored")).unwrap();

        assert_eq!(options.input, PathBuf::from("/p/packages/ui/src/index.js"));
        assert_eq!(options.output, Some(PathBuf::from("/p/packages/ui/dist/ui.js")));
        assert_eq!(options.name.as_deref(), Some("UiKit"));
    }

    #[test]
    fn test_package_with_main_only_uses_explicit_output() {
        let pkg = PackageTarget::new(PathBuf::from("/p"), manifest("app", Some("index.js"), None));
        let options = pkg.job_options(&BuildOptions::new().with_output("dist")).unwrap();

        assert_eq!(options.input, PathBuf::from("/p/index.js"));
        assert_eq!(options.output, Some(PathBuf::from("dist")));
        assert_eq!(options.name.as_deref(), Some("App"));
    }

    #[test]
    fn test_package_without_main_or_output_is_rejected() {
        let pkg = PackageTarget::new(PathBuf::from("/p"), manifest("lib", None, Some("src/lib.js")));
        let result = pkg.job_options(&BuildOptions::new());
        match result {
            Err(ConfigError::MissingMain { package }) => assert_eq!(package, "lib"),
            other => panic!("expected missing main, got {:?}", other),
        }
    }

    #[test]
    fn test_package_module_without_main_uses_output() {
        let pkg = PackageTarget::new(PathBuf::from("/p"), manifest("lib", None, Some("src/lib.js")));
        let options = pkg.job_options(&BuildOptions::new().with_output("/out/lib.js")).unwrap();
        assert_eq!(options.input, PathBuf::from("/p/src/lib.js"));
        assert_eq!(options.output, Some(PathBuf::from("/out/lib.js")));
    }

    #[test]
    fn test_package_name_falls_back_to_directory() {
        let pkg = PackageTarget::new(PathBuf::from("/p/packages/date-picker"), manifest("", Some("a.js"), None));
        assert_eq!(pkg.name, "date-picker");
    }

    #[test]
    fn test_file_output_relative_to_each_file_when_shared() {
        let file = FileTarget::new(PathBuf::from("/p/src/widgets/a.js"));
        let base = BuildOptions::new().with_output("dist");

        let shared = file.job_options(&base, true);
        assert_eq!(shared.output, Some(PathBuf::from("/p/src/widgets/dist")));

        let single = file.job_options(&base, false);
        assert_eq!(single.output, Some(PathBuf::from("dist")));
        assert_eq!(single.input, PathBuf::from("/p/src/widgets/a.js"));
    }

    #[test]
    fn test_plan_orders_packages_first_and_dedupes() {
        let mut plan = BuildPlan::new();
        plan.add(Target::File(FileTarget::new(PathBuf::from("/p/a.js"))));
        plan.add(Target::Package(PackageTarget::new(
            PathBuf::from("/p"),
            manifest("root", Some("index.js"), None),
        )));
        plan.add(Target::File(FileTarget::new(PathBuf::from("/p/a.js"))));
        plan.add(Target::File(FileTarget::new(PathBuf::from("/p/b.js"))));

        let labels: Vec<_> = plan.targets().iter().map(Target::label).collect();
        assert_eq!(labels, vec!["root", "/p/a.js", "/p/b.js"]);
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn test_plan_jobs_validates_before_building_any() {
        let mut plan = BuildPlan::new();
        plan.add(Target::Package(PackageTarget::new(
            PathBuf::from("/p/packages/good"),
            manifest("good", Some("dist/good.js"), Some("src/good.js")),
        )));
        plan.add(Target::Package(PackageTarget::new(
            PathBuf::from("/p/packages/bad"),
            manifest("bad", None, Some("src/bad.js")),
        )));

        let result = plan.jobs(&BuildOptions::new());
        assert!(matches!(result, Err(ConfigError::MissingMain { ref package }) if package == "bad"));
    }

    #[test]
    fn test_plan_jobs_shared_output_only_for_multiple_files() {
        let mut plan = BuildPlan::new();
        plan.add(Target::File(FileTarget::new(PathBuf::from("/p/x/a.js"))));
        plan.add(Target::File(FileTarget::new(PathBuf::from("/p/y/b.js"))));

        let jobs = plan.jobs(&BuildOptions::new().with_output("out")).unwrap();
        assert_eq!(jobs[0].options.output, Some(PathBuf::from("/p/x/out")));
        assert_eq!(jobs[1].options.output, Some(PathBuf::from("/p/y/out")));
    }
}
