//! Fail-fast worker pool.
//!
//! Runs a list of jobs in index order on up to `jobs` scoped threads.
//!
//! # How It Works
//!
//! 1. Workers claim the next unclaimed index from a shared counter
//! 2. A worker whose job fails raises the shared abort flag
//! 3. No worker claims a new index once the flag is up; running jobs finish
//! 4. Results are sorted by index and the lowest-index error is returned
//!
//! With `jobs == 1` the pool runs everything on the calling thread and job
//! `i + 1` is never started unless job `i` succeeded.
//!
//! # Example
//!
//! ```ignore
//! use rna::build::WorkerPool;
//!
//! let outputs = WorkerPool::new(4).run(&targets, |index, target| build(index, target))?;
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Worker pool with a fixed number of workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    jobs: usize,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(1)
    }
}

impl WorkerPool {
    /// Create a pool; `jobs` is clamped to at least 1.
    pub fn new(jobs: usize) -> Self {
        Self { jobs: jobs.max(1) }
    }

    /// Number of workers.
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Run `work` over `items`, stopping at the first failure.
    ///
    /// Returns every result in index order, or the error of the
    /// lowest-index job that failed.
    pub fn run<T, R, E, F>(&self, items: &[T], work: F) -> Result<Vec<R>, E>
    where
        T: Sync,
        R: Send,
        E: Send,
        F: Fn(usize, &T) -> Result<R, E> + Sync,
    {
        if self.jobs == 1 || items.len() <= 1 {
            return items.iter().enumerate().map(|(i, item)| work(i, item)).collect();
        }

        let results = Mutex::new(Vec::with_capacity(items.len()));
        let failed = AtomicBool::new(false);
        let next_idx = AtomicUsize::new(0);

        std::thread::scope(|s| {
            let num_workers = self.jobs.min(items.len());

            for _ in 0..num_workers {
                let results = &results;
                let failed = &failed;
                let next_idx = &next_idx;
                let work = &work;

                s.spawn(move || loop {
                    if failed.load(Ordering::SeqCst) {
                        break;
                    }

                    let idx = next_idx.fetch_add(1, Ordering::SeqCst);
                    if idx >= items.len() {
                        break;
                    }

                    let result = work(idx, &items[idx]);
                    if result.is_err() {
                        failed.store(true, Ordering::SeqCst);
                    }

                    results.lock().unwrap_or_else(PoisonError::into_inner).push((idx, result));
                });
            }
        });

        // Sort results by original index to maintain deterministic order
        let mut results = results.into_inner().unwrap_or_else(PoisonError::into_inner);
        results.sort_by_key(|(idx, _)| *idx);

        results.into_iter().map(|(_, r)| r).collect()
    }
}
