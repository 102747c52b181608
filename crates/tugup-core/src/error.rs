//! Error types and error code constants for tugup.
//!
//! This module provides a unified error type (`TugupError`) for everything
//! that can abort a run or fail a single file, rendered into JSON output by
//! [`crate::output`].
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments or configuration
//! - `3`: Resolution errors (input path not found)
//! - `4`: Apply errors (file could not be decoded, rewritten or written)
//! - `10`: Internal errors (bugs, unexpected state)
//!
//! Per-file failures are reported in the run summary and do not change the
//! process exit code by themselves; the driver maps them to `1`.
//!
//! ## Design
//!
//! - **Unified type**: `TugupError` is the single error type for CLI output
//! - **Bridging**: `impl From<X> for TugupError` lives next to the language
//!   errors it converts
//! - **Code mapping**: `OutputErrorCode` provides stable integer codes for JSON

use std::fmt;

use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments or configuration.
    InvalidArguments = 2,
    /// An input path does not exist.
    ResolutionError = 3,
    /// A file could not be decoded, rewritten or written back.
    ApplyError = 4,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum TugupError {
    /// Invalid arguments from the caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// The configuration file could not be read or parsed.
    #[error("invalid config {path}: {message}")]
    InvalidConfig { path: String, message: String },

    /// An input path does not exist.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// The file is not valid UTF-8.
    #[error("{path}: cannot decode as UTF-8: {message}")]
    DecodeError { path: String, message: String },

    /// A rule or an edit failed; the file was left unmodified.
    #[error("{path}: rewrite failed: {message}")]
    RewriteFailed {
        path: String,
        rule: Option<String>,
        message: String,
    },

    /// Reading or writing a file failed.
    #[error("{path}: {message}")]
    Io { path: String, message: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&TugupError> for OutputErrorCode {
    fn from(err: &TugupError) -> Self {
        match err {
            TugupError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            TugupError::InvalidConfig { .. } => OutputErrorCode::InvalidArguments,
            TugupError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            TugupError::DecodeError { .. } => OutputErrorCode::ApplyError,
            TugupError::RewriteFailed { .. } => OutputErrorCode::ApplyError,
            TugupError::Io { .. } => OutputErrorCode::ApplyError,
            TugupError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<TugupError> for OutputErrorCode {
    fn from(err: TugupError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl TugupError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        TugupError::InvalidArguments {
            message: message.into(),
            details: None,
        }
    }

    /// Create an invalid arguments error with JSON details.
    pub fn invalid_args_with_details(
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        TugupError::InvalidArguments {
            message: message.into(),
            details: Some(details),
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        TugupError::FileNotFound { path: path.into() }
    }

    /// Create an I/O error for `path`.
    pub fn io(path: impl Into<String>, err: &std::io::Error) -> Self {
        TugupError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        TugupError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
