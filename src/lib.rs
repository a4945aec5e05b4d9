//! RNA - incremental multi-target bundler orchestrator
//!
//! This library provides functionality to:
//! - Resolve packages and entry files of a JavaScript workspace into jobs
//! - Describe each job as a pipeline of transformation stages
//! - Drive a bundling engine over the jobs, failing fast, and keep the
//!   resolved module graphs for incremental rebuilds
//! - Watch the project and rebuild on changes

pub mod build;
pub mod cli;
pub mod config;
pub mod init;
pub mod watch;
