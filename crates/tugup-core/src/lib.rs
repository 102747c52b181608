//! Core infrastructure for tugup.
//!
//! This crate provides the language-agnostic half of the rewrite engine:
//! - Source positions and line indexing
//! - A full-fidelity tokenizer and the dedent-ordering normalizer
//! - The mutable token stream and its edit primitives
//! - Position-keyed edit scheduling and reverse-order patch application
//! - Error types and error codes
//! - JSON output types and unified diff generation

pub mod diff;
pub mod error;
pub mod output;
pub mod patch;
pub mod stream;
pub mod text;
pub mod tokenizer;
