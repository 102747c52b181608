//! Python upgrade engine for tugup.
//!
//! This crate binds the token-level machinery of `tugup-core` to Python:
//! - The tree-sitter backed structural tree and its node kinds
//! - Per-file context with accumulated import state
//! - The version-gated rule registry and the traversal that drives it
//! - Python-aware edit helpers (statement removal, import rewriting)
//! - The per-file rewrite pipeline and file discovery
//! - The built-in rules

pub mod context;
pub mod edits;
pub mod files;
pub mod registry;
pub mod rewrite;
pub mod rules;
pub mod traverse;
pub mod tree;
pub mod version;

pub use rewrite::{Engine, EngineConfig, Rewrite, RewriteError};
pub use version::TargetVersion;
