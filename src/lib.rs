//! tugup: version-gated Django upgrades that rewrite only the tokens they must.
//!
//! The engine lives in the workspace crates:
//! - `tugup-core`: full-fidelity tokens, edit primitives, reverse patch application
//! - `tugup-python`: structural tree, rule registry, traversal, built-in rules
//!
//! This crate adds the front door: config loading, the parallel batch
//! driver and output formatting.

pub use tugup_core::diff;
pub use tugup_core::error;
pub use tugup_core::output;
pub use tugup_python::{Engine, EngineConfig, Rewrite, RewriteError, TargetVersion};

pub mod cli;
pub mod config;

// Converts engine errors to TugupError
mod error_bridges;
