//! JSON output types and serialization for CLI responses.
//!
//! ## Design Principles
//!
//! 1. **Status first:** Every response has `status` as first field
//! 2. **Deterministic:** Same input -> same output (files sorted by path)
//! 3. **Nullable vs absent:** Absent field means "not applicable"
//! 4. **Versioned:** Schema version in response enables forward compatibility

use std::fmt;
use std::io::{self, Write};

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{OutputErrorCode, TugupError};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Error Types
// ============================================================================

/// Error information for error responses and failed files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    /// Create from a TugupError.
    pub fn from_error(err: &TugupError) -> Self {
        let code = OutputErrorCode::from(err).code();
        let message = err.to_string();

        let details = match err {
            TugupError::InvalidArguments { details, .. } => details.clone(),
            TugupError::InvalidConfig { path, .. } => Some(serde_json::json!({ "path": path })),
            TugupError::FileNotFound { path } => Some(serde_json::json!({ "path": path })),
            TugupError::RewriteFailed {
                rule: Some(rule), ..
            } => Some(serde_json::json!({ "rule": rule })),
            _ => None,
        };

        ErrorInfo {
            code,
            message,
            details,
        }
    }
}

/// Response for a run that failed before any file was processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Error information.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create an error response from a TugupError.
    pub fn from_error(err: &TugupError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Per-File Reports
// ============================================================================

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// No rule matched.
    Unchanged,
    /// At least one edit was applied (or would be, in check/diff mode).
    Rewritten,
    /// The file could not be lexed or parsed and was left alone.
    Skipped,
    /// The file could not be decoded, rewritten or written back.
    Error,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileStatus::Unchanged => "unchanged",
            FileStatus::Rewritten => "rewritten",
            FileStatus::Skipped => "skipped",
            FileStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Outcome of processing one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub path: String,
    pub status: FileStatus,
    /// Number of edit callbacks applied.
    pub edits: usize,
    /// Why the file was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    /// Unified diff (diff mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

impl FileReport {
    pub fn unchanged(path: impl Into<String>) -> Self {
        FileReport::new(path, FileStatus::Unchanged, 0)
    }

    pub fn rewritten(path: impl Into<String>, edits: usize) -> Self {
        FileReport::new(path, FileStatus::Rewritten, edits)
    }

    pub fn skipped(path: impl Into<String>, reason: impl Into<String>) -> Self {
        FileReport {
            reason: Some(reason.into()),
            ..FileReport::new(path, FileStatus::Skipped, 0)
        }
    }

    pub fn failed(path: impl Into<String>, err: &TugupError) -> Self {
        FileReport {
            error: Some(ErrorInfo::from_error(err)),
            ..FileReport::new(path, FileStatus::Error, 0)
        }
    }

    /// Attach a unified diff.
    pub fn with_diff(mut self, diff: String) -> Self {
        self.diff = Some(diff);
        self
    }

    fn new(path: impl Into<String>, status: FileStatus, edits: usize) -> Self {
        FileReport {
            path: path.into(),
            status,
            edits,
            reason: None,
            error: None,
            diff: None,
        }
    }
}

/// Counts over all file reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub files_scanned: usize,
    pub files_rewritten: usize,
    pub files_unchanged: usize,
    pub files_skipped: usize,
    pub files_errored: usize,
    pub edits_applied: usize,
}

impl Summary {
    pub fn from_reports(reports: &[FileReport]) -> Self {
        let mut summary = Summary {
            files_scanned: reports.len(),
            ..Summary::default()
        };
        for report in reports {
            summary.edits_applied += report.edits;
            match report.status {
                FileStatus::Unchanged => summary.files_unchanged += 1,
                FileStatus::Rewritten => summary.files_rewritten += 1,
                FileStatus::Skipped => summary.files_skipped += 1,
                FileStatus::Error => summary.files_errored += 1,
            }
        }
        summary
    }

    /// True when any file was (or would be) rewritten or failed.
    pub fn is_dirty(&self) -> bool {
        self.files_rewritten > 0 || self.files_errored > 0
    }
}

// ============================================================================
// Run Response
// ============================================================================

/// Response for a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
    /// Status: "ok".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Target version the rules were gated against.
    pub target_version: String,
    /// "write", "check" or "diff".
    pub mode: String,
    /// Per-file outcomes, sorted by path.
    #[serde(serialize_with = "serialize_sorted_files")]
    pub files: Vec<FileReport>,
    pub summary: Summary,
}

impl RunResponse {
    pub fn new(
        target_version: impl Into<String>,
        mode: impl Into<String>,
        files: Vec<FileReport>,
    ) -> Self {
        let summary = Summary::from_reports(&files);
        RunResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            target_version: target_version.into(),
            mode: mode.into(),
            files,
            summary,
        }
    }
}

/// Serialize file reports sorted by path.
fn serialize_sorted_files<S>(files: &[FileReport], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut sorted: Vec<_> = files.iter().collect();
    sorted.sort_by(|a, b| a.path.cmp(&b.path));
    sorted.serialize(serializer)
}

// ============================================================================
// Response Emission
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================
