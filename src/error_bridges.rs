//! Error bridge implementations for Python engine errors.
//!
//! This module provides `impl From<X> for TugupError` conversions from the
//! error types of `tugup-python` to the unified `TugupError` type.
//!
//! These bridges live in the root crate rather than `tugup-core` because
//! `tugup-core` does not depend on the Python engine.

use std::path::Path;

use tugup_core::error::TugupError;
use tugup_python::RewriteError;

// ============================================================================
// Bridge: FileError -> TugupError
// ============================================================================

// The `From<FileError> for TugupError` impl lives in `tugup_python::files`:
// the orphan rule forbids implementing a foreign trait for two foreign types
// here.

// ============================================================================
// Bridge: RewriteError -> TugupError
// ============================================================================

/// Attach the file path a [`RewriteError`] happened in.
pub(crate) fn rewrite_failed(path: &Path, err: &RewriteError) -> TugupError {
    TugupError::RewriteFailed {
        path: path.display().to_string(),
        rule: err.rule().map(str::to_string),
        message: err.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
