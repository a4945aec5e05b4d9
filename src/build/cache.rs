//! In-process bundle cache.
//!
//! Holds the last resolved module graph and the resolved options for each
//! input, so a repeated build of the same input (the next run of a watch
//! session, or the same entry reached twice) hands the engine its previous
//! graph. Entries are keyed by absolute input path, overwritten on every
//! successful job and never evicted.

use crate::build::BuildOptions;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Cached state for one input.
#[derive(Debug)]
pub struct CacheEntry<G> {
    /// Graph produced by the last successful job
    pub graph: Arc<G>,
    /// Options that job ran with, after resolution
    pub options: BuildOptions,
}

impl<G> Clone for CacheEntry<G> {
    fn clone(&self) -> Self {
        Self { graph: Arc::clone(&self.graph), options: self.options.clone() }
    }
}

/// Map from absolute input path to its last successful build.
#[derive(Debug)]
pub struct BundleCache<G> {
    entries: HashMap<PathBuf, CacheEntry<G>>,
}

impl<G> Default for BundleCache<G> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<G> BundleCache<G> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the entry for an input.
    pub fn get(&self, input: &Path) -> Option<&CacheEntry<G>> {
        self.entries.get(input)
    }

    /// Record a successful job, replacing any previous entry.
    pub fn put(&mut self, input: PathBuf, graph: Arc<G>, options: BuildOptions) {
        let replaced = self.entries.insert(input.clone(), CacheEntry { graph, options }).is_some();
        tracing::debug!(input = %input.display(), replaced, "cached bundle graph");
    }

    /// Whether an entry exists for an input.
    pub fn contains(&self, input: &Path) -> bool {
        self.entries.contains_key(input)
    }

    /// Number of cached inputs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
