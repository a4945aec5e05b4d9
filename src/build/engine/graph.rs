//! Module graph resolution.
//!
//! Scripts are parsed with `oxc` and their `import`, `export ... from`,
//! dynamic `import()` and `require()` specifiers collected from the AST, so
//! commented-out or string-embedded imports never count. Stylesheets are
//! scanned for `@import` rules once comments are stripped. Relative
//! specifiers go through `oxc_resolver` with extension and `index` probing;
//! bare specifiers are recorded as externals and left to the bundler.
//!
//! When a previous graph is supplied, modules whose modification time has
//! not changed are taken from it without being read again.

use super::EngineError;
use oxc::allocator::Allocator;
use oxc::ast::ast;
use oxc::ast_visit::{walk, Visit};
use oxc::parser::Parser;
use oxc::span::SourceType;
use oxc_resolver::{ResolveOptions, Resolver};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;
use sugar_path::SugarPath;

const SCRIPT_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs"];
const STYLE_EXTENSIONS: &[&str] = &["css", "scss", "sass"];
const SCRIPT_PROBES: &[&str] = &[".js", ".jsx", ".mjs", ".cjs", ".json"];
const STYLE_PROBES: &[&str] = &[".scss", ".sass", ".css"];

fn style_comment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)/\*.*?\*/|(?m)^[ \t]*//[^\n]*").expect("static comment pattern")
    })
}

fn style_import_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"@import\s+(?:url\(\s*)?["']?([^"')\s;]+)["']?"#)
            .expect("static @import pattern")
    })
}

/// Kind of module, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModuleKind {
    Script,
    Style,
    Asset,
}

fn module_kind(path: &Path) -> ModuleKind {
    let ext = path.extension().map(|e| e.to_string_lossy().to_lowercase()).unwrap_or_default();
    if SCRIPT_EXTENSIONS.contains(&ext.as_str()) {
        ModuleKind::Script
    } else if STYLE_EXTENSIONS.contains(&ext.as_str()) {
        ModuleKind::Style
    } else {
        ModuleKind::Asset
    }
}

/// Collects module requests from a script AST, in source order.
#[derive(Default)]
struct ImportCollector {
    seen: BTreeSet<String>,
    specifiers: Vec<String>,
}

impl ImportCollector {
    fn add(&mut self, specifier: &str) {
        if self.seen.insert(specifier.to_string()) {
            self.specifiers.push(specifier.to_string());
        }
    }
}

impl<'a> Visit<'a> for ImportCollector {
    fn visit_import_declaration(&mut self, decl: &ast::ImportDeclaration<'a>) {
        self.add(decl.source.value.as_str());
        walk::walk_import_declaration(self, decl);
    }

    fn visit_export_all_declaration(&mut self, decl: &ast::ExportAllDeclaration<'a>) {
        self.add(decl.source.value.as_str());
        walk::walk_export_all_declaration(self, decl);
    }

    fn visit_export_named_declaration(&mut self, decl: &ast::ExportNamedDeclaration<'a>) {
        if let Some(source) = &decl.source {
            self.add(source.value.as_str());
        }
        walk::walk_export_named_declaration(self, decl);
    }

    fn visit_import_expression(&mut self, expr: &ast::ImportExpression<'a>) {
        if let ast::Expression::StringLiteral(request) = &expr.source {
            self.add(request.value.as_str());
        }
        walk::walk_import_expression(self, expr);
    }

    fn visit_call_expression(&mut self, expr: &ast::CallExpression<'a>) {
        if expr.callee.is_specific_id("require") && expr.arguments.len() == 1 {
            if let ast::Argument::StringLiteral(request) = &expr.arguments[0] {
                self.add(request.value.as_str());
            }
        }
        walk::walk_call_expression(self, expr);
    }
}

/// Extract import specifiers from a script, in order of appearance.
///
/// `path` only selects the source type (module, CommonJS, JSX).
pub fn script_specifiers(path: &Path, source: &str) -> Result<Vec<String>, EngineError> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(path).unwrap_or_default();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if let Some(error) = ret.errors.first() {
        return Err(EngineError::Parse { path: path.to_path_buf(), message: error.to_string() });
    }

    let mut collector = ImportCollector::default();
    collector.visit_program(&ret.program);
    Ok(collector.specifiers)
}

/// Extract `@import` specifiers from a stylesheet, ignoring commented rules.
pub fn style_specifiers(source: &str) -> Vec<String> {
    let stripped = style_comment_pattern().replace_all(source, "");
    let mut seen = BTreeSet::new();
    style_import_pattern()
        .captures_iter(&stripped)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

fn is_relative(specifier: &str, kind: ModuleKind) -> bool {
    match kind {
        ModuleKind::Style => {
            !(specifier.starts_with('~')
                || specifier.starts_with("http://")
                || specifier.starts_with("https://")
                || specifier.starts_with("//"))
        }
        _ => specifier.starts_with("./") || specifier.starts_with("../") || specifier.starts_with('/'),
    }
}

fn resolver_for(extensions: &[&str]) -> Resolver {
    Resolver::new(ResolveOptions {
        extensions: extensions.iter().map(|e| e.to_string()).collect(),
        symlinks: false,
        ..ResolveOptions::default()
    })
}

/// Resolves relative specifiers for scripts and stylesheets.
struct ModuleResolver {
    scripts: Resolver,
    styles: Resolver,
}

impl ModuleResolver {
    fn new() -> Self {
        Self { scripts: resolver_for(SCRIPT_PROBES), styles: resolver_for(STYLE_PROBES) }
    }

    /// Resolve a relative specifier from `importer` to an existing file.
    fn resolve(&self, importer: &Path, specifier: &str, kind: ModuleKind) -> Option<PathBuf> {
        let dir = importer.parent().unwrap_or_else(|| Path::new("/"));
        match kind {
            ModuleKind::Style => {
                // Sass resolves `foo` as `./foo` and falls back to the `_foo` partial.
                let request = if specifier.starts_with('.') || specifier.starts_with('/') {
                    specifier.to_string()
                } else {
                    format!("./{specifier}")
                };
                let partial = match request.rsplit_once('/') {
                    Some((head, name)) => format!("{head}/_{name}"),
                    None => format!("_{request}"),
                };
                [request, partial]
                    .iter()
                    .find_map(|candidate| self.styles.resolve(dir, candidate).ok())
                    .map(|resolution| resolution.path().normalize())
            }
            _ => self
                .scripts
                .resolve(dir, specifier)
                .ok()
                .map(|resolution| resolution.path().normalize()),
        }
    }
}

/// A module in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleNode {
    /// Absolute module path
    pub path: PathBuf,
    /// Modification time when the module was scanned
    pub modified: Option<SystemTime>,
    /// Resolved local dependencies, in import order
    pub dependencies: Vec<PathBuf>,
    /// Bare specifiers imported by this module
    pub externals: Vec<String>,
}

/// Resolved module graph of one bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleGraph {
    entry: PathBuf,
    modules: BTreeMap<PathBuf, ModuleNode>,
    externals: BTreeSet<String>,
    reused: usize,
}

impl ModuleGraph {
    /// Resolve the graph reachable from `entry`.
    pub fn resolve(entry: &Path, previous: Option<&ModuleGraph>) -> Result<Self, EngineError> {
        if !entry.is_file() {
            return Err(EngineError::Resolve {
                input: entry.to_path_buf(),
                message: "entry module not found".to_string(),
            });
        }

        let mut modules = BTreeMap::new();
        let mut externals = BTreeSet::new();
        let mut reused = 0;
        let mut queue = VecDeque::from([entry.to_path_buf()]);
        let resolver = ModuleResolver::new();

        while let Some(path) = queue.pop_front() {
            if modules.contains_key(&path) {
                continue;
            }

            let metadata = fs::metadata(&path)
                .map_err(|source| EngineError::Read { path: path.clone(), source })?;
            let modified = metadata.modified().ok();

            let cached = previous
                .and_then(|graph| graph.modules.get(&path))
                .filter(|node| node.modified.is_some() && node.modified == modified);

            let node = match cached {
                Some(node) => {
                    reused += 1;
                    node.clone()
                }
                None => scan_module(&path, modified, &resolver)?,
            };

            externals.extend(node.externals.iter().cloned());
            for dep in &node.dependencies {
                if !modules.contains_key(dep) {
                    queue.push_back(dep.clone());
                }
            }
            modules.insert(path, node);
        }

        tracing::debug!(
            entry = %entry.display(),
            modules = modules.len(),
            reused,
            "resolved module graph"
        );
        Ok(Self { entry: entry.to_path_buf(), modules, externals, reused })
    }

    /// Entry module.
    pub fn entry(&self) -> &Path {
        &self.entry
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the graph has no modules.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Whether a module is part of the graph.
    pub fn contains(&self, path: &Path) -> bool {
        self.modules.contains_key(path)
    }

    /// Module node for a path.
    pub fn module(&self, path: &Path) -> Option<&ModuleNode> {
        self.modules.get(path)
    }

    /// All module paths, sorted.
    pub fn module_paths(&self) -> Vec<&Path> {
        self.modules.keys().map(PathBuf::as_path).collect()
    }

    /// Bare specifiers left to the bundler, sorted.
    pub fn externals(&self) -> &BTreeSet<String> {
        &self.externals
    }

    /// Number of modules taken from the previous graph.
    pub fn reused(&self) -> usize {
        self.reused
    }
}

fn scan_module(
    path: &Path,
    modified: Option<SystemTime>,
    resolver: &ModuleResolver,
) -> Result<ModuleNode, EngineError> {
    let kind = module_kind(path);
    let mut node = ModuleNode {
        path: path.to_path_buf(),
        modified,
        dependencies: Vec::new(),
        externals: Vec::new(),
    };
    if kind == ModuleKind::Asset {
        return Ok(node);
    }

    let source = fs::read_to_string(path)
        .map_err(|source| EngineError::Read { path: path.to_path_buf(), source })?;
    let specifiers = match kind {
        ModuleKind::Style => style_specifiers(&source),
        _ => script_specifiers(path, &source)?,
    };
    for specifier in specifiers {
        if is_relative(&specifier, kind) {
            let dep = resolver.resolve(path, &specifier, kind).ok_or_else(|| {
                EngineError::UnresolvedImport {
                    importer: path.to_path_buf(),
                    specifier: specifier.clone(),
                }
            })?;
            node.dependencies.push(dep);
        } else {
            node.externals.push(specifier);
        }
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_script_specifiers() {
        let source = r#"
import { IDOM } from '@dnajs/idom';
import './polyfills.js';
import Button, { Icon } from "./button";
export * from './utils';
export { a, b } from './ab.js';
const lazy = import('./lazy.js');
const fs = require('fs');
"#;
        assert_eq!(
            script_specifiers(Path::new("index.js"), source).unwrap(),
            vec!["@dnajs/idom", "./polyfills.js", "./button", "./utils", "./ab.js", "./lazy.js", "fs"]
        );
    }

    #[test]
    fn test_script_specifiers_skip_comments_and_strings() {
        let source = r#"// import './legacy.js';
/* require('./old') */
const text = "import './inside-a-string.js'";
export default text;
"#;
        assert!(script_specifiers(Path::new("index.js"), source).unwrap().is_empty());
    }

    #[test]
    fn test_script_specifiers_deduplicate() {
        let source = "import a from './a.js';\nconst b = require('./a.js');\n";
        assert_eq!(script_specifiers(Path::new("index.js"), source).unwrap(), vec!["./a.js"]);
    }

    #[test]
    fn test_script_syntax_error() {
        let result = script_specifiers(Path::new("broken.js"), "import { from './a.js';\n");
        match result {
            Err(EngineError::Parse { path, .. }) => assert_eq!(path, PathBuf::from("broken.js")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_style_specifiers() {
        let source = "@import 'variables';\n@import url(\"./base.css\");\n.a { color: red; }\n";
        assert_eq!(style_specifiers(source), vec!["variables", "./base.css"]);
    }

    #[test]
    fn test_style_specifiers_skip_comments() {
        let source = "/* @import 'old'; */\n// @import 'older';\n@import 'current';\n";
        assert_eq!(style_specifiers(source), vec!["current"]);
    }

    #[test]
    fn test_commented_import_does_not_fail_graph() {
        let temp = TempDir::new().unwrap();
        let entry = write(
            temp.path(),
            "index.js",
            "// import './legacy.js';\n/* require('./old') */\nexport default 1;\n",
        );

        let graph = ModuleGraph::resolve(&entry, None).unwrap();
        assert_eq!(graph.len(), 1);
        assert!(graph.module(&entry).unwrap().dependencies.is_empty());
    }

    #[test]
    fn test_resolve_graph() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let entry = write(
            root,
            "src/index.js",
            "import './style.scss';\nimport { h } from './lib';\nimport x from 'lodash';\nimport logo from './logo.svg';\n",
        );
        write(root, "src/lib/index.js", "export const h = require('../util');\n");
        write(root, "src/util.js", "module.exports = 1;\n");
        write(root, "src/style.scss", "@import 'mixins';\n");
        write(root, "src/_mixins.scss", "$a: 1;\n");
        write(root, "src/logo.svg", "<svg/>");

        let graph = ModuleGraph::resolve(&entry, None).unwrap();
        assert_eq!(graph.len(), 6);
        assert!(graph.contains(&root.join("src/lib/index.js")));
        assert!(graph.contains(&root.join("src/util.js")));
        assert!(graph.contains(&root.join("src/_mixins.scss")));
        assert!(graph.contains(&root.join("src/logo.svg")));
        assert_eq!(graph.externals().iter().collect::<Vec<_>>(), vec!["lodash"]);
        assert_eq!(graph.reused(), 0);
        assert_eq!(graph.entry(), entry.as_path());
    }

    #[test]
    fn test_unresolved_relative_import() {
        let temp = TempDir::new().unwrap();
        let entry = write(temp.path(), "index.js", "import './missing.js';\n");

        let result = ModuleGraph::resolve(&entry, None);
        match result {
            Err(EngineError::UnresolvedImport { specifier, .. }) => {
                assert_eq!(specifier, "./missing.js")
            }
            other => panic!("expected unresolved import, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_entry() {
        let temp = TempDir::new().unwrap();
        let result = ModuleGraph::resolve(&temp.path().join("nope.js"), None);
        assert!(matches!(result, Err(EngineError::Resolve { .. })));
    }

    #[test]
    fn test_previous_graph_reuses_unchanged_modules() {
        let temp = TempDir::new().unwrap();
        let entry = write(temp.path(), "index.js", "import './a.js';\n");
        let a = write(temp.path(), "a.js", "export default 1;\n");

        let first = ModuleGraph::resolve(&entry, None).unwrap();
        let second = ModuleGraph::resolve(&entry, Some(&first)).unwrap();
        assert_eq!(second.reused(), 2);

        // Rewrite `a.js` with a new import and a later modification time.
        let later = SystemTime::now() + Duration::from_secs(60);
        write(temp.path(), "b.js", "export default 2;\n");
        fs::write(&a, "import './b.js';\n").unwrap();
        fs::File::options().write(true).open(&a).unwrap().set_modified(later).unwrap();

        let third = ModuleGraph::resolve(&entry, Some(&second)).unwrap();
        assert_eq!(third.reused(), 1);
        assert!(third.contains(&temp.path().join("b.js")));
    }
}
