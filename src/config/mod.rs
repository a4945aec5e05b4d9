//! Configuration module for the rna build system
//!
//! Provides project discovery, `rna.toml` settings, the project files the
//! default pipeline reads, and the pluggable full-pipeline override.

pub mod loader;
pub mod project;
pub mod provider;
pub mod schema;

pub use loader::*;
pub use project::*;
pub use provider::*;
pub use schema::*;
