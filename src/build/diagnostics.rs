//! Bundler diagnostics.
//!
//! Warnings come back from the engine as typed values. Two categories are
//! known noise for UMD bundles built with runtime helpers and are hidden
//! unless the build is verbose.

use serde::{Deserialize, Serialize};

/// Category of a bundler diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCategory {
    /// Top-level `this` rewritten to `undefined`
    ThisRewrite,
    /// Suggestion to install the external helpers plugin
    ExternalHelpers,
    /// Anything else
    #[default]
    General,
}

impl DiagnosticCategory {
    /// Categories hidden from non-verbose builds.
    pub const NOISE: [DiagnosticCategory; 2] =
        [DiagnosticCategory::ThisRewrite, DiagnosticCategory::ExternalHelpers];

    /// Categories a pipeline suppresses for the given verbosity.
    pub fn suppressed(verbose: bool) -> Vec<DiagnosticCategory> {
        if verbose {
            Vec::new()
        } else {
            Self::NOISE.to_vec()
        }
    }
}

impl std::fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticCategory::ThisRewrite => write!(f, "this-rewrite"),
            DiagnosticCategory::ExternalHelpers => write!(f, "external-helpers"),
            DiagnosticCategory::General => write!(f, "general"),
        }
    }
}

/// A warning emitted while resolving or writing a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Category used for filtering
    #[serde(default)]
    pub category: DiagnosticCategory,
    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic.
    pub fn new(category: DiagnosticCategory, message: impl Into<String>) -> Self {
        Self { category, message: message.into() }
    }

    /// Create a general diagnostic.
    pub fn general(message: impl Into<String>) -> Self {
        Self::new(DiagnosticCategory::General, message)
    }

    /// Categorize a plain-text bundler warning.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let category = if message.contains("The 'this' keyword") {
            DiagnosticCategory::ThisRewrite
        } else if message.contains("\"external-helpers\" plugin") {
            DiagnosticCategory::ExternalHelpers
        } else {
            DiagnosticCategory::General
        };
        Self { category, message }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Keep only diagnostics whose category is not in `suppressed`.
pub fn surface(
    diagnostics: Vec<Diagnostic>,
    suppressed: &[DiagnosticCategory],
) -> Vec<Diagnostic> {
    diagnostics.into_iter().filter(|d| !suppressed.contains(&d.category)).collect()
}
