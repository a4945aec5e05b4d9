//! Incremental multi-target bundling.
//!
//! # Overview
//!
//! A build run goes through these parts:
//! - **Discovery**: turn specifiers into package and file targets
//! - **Planning**: validate the targets and derive one job per target
//! - **Configuration**: build the [`Pipeline`] of stages for each job
//! - **Bundling**: a [`BundleEngine`] resolves the module graph and writes
//!   the artifact, reusing the graph kept in the [`BundleCache`]
//!
//! The [`Scheduler`] drives these steps and stops at the first failure.
//!
//! # Example
//!
//! ```ignore
//! use rna::build::{BuildContext, BuildOptions, BundleCache, CommandEngine, Scheduler};
//!
//! let context = BuildContext::discover(&std::env::current_dir()?)?;
//! let engine = CommandEngine::from_settings(&context.config().build, context.project_root());
//! let mut cache = BundleCache::new();
//!
//! let outputs = Scheduler::new(&context, &engine, &mut cache).run(&BuildOptions::new(), &[])?;
//! println!("Wrote {} bundles", outputs.len());
//! ```

pub mod cache;
pub mod context;
pub mod diagnostics;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod naming;
pub mod options;
pub mod output;
pub mod parallel;
pub mod pipeline;
pub mod progress;
pub mod scheduler;
pub mod target;

pub use cache::*;
pub use context::*;
pub use diagnostics::*;
pub use discovery::*;
pub use engine::*;
pub use error::*;
pub use naming::*;
pub use options::*;
pub use output::*;
pub use parallel::*;
pub use pipeline::*;
pub use progress::*;
pub use scheduler::*;
pub use target::*;
