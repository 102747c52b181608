//! Python file discovery and decoding.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tugup_core::error::TugupError;
use walkdir::{DirEntry, WalkDir};

// ============================================================================
// Error Types
// ============================================================================

/// Error type for file operations.
#[derive(Debug, Error)]
pub enum FileError {
    /// A path named on the command line does not exist.
    #[error("file not found: {path}")]
    NotFound { path: String },

    /// File contents are not valid UTF-8.
    #[error("{path}: not valid UTF-8: {message}")]
    Decode { path: String, message: String },

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl FileError {
    fn io(path: &Path, source: io::Error) -> Self {
        FileError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

// Bridge: FileError -> TugupError
impl From<FileError> for TugupError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::NotFound { path } => TugupError::FileNotFound { path },
            FileError::Decode { path, message } => TugupError::DecodeError { path, message },
            FileError::Io { path, source } => TugupError::io(path, &source),
        }
    }
}

/// Result type for file operations.
pub type FileResult<T> = Result<T, FileError>;

// ============================================================================
// File Collection
// ============================================================================

/// Directory names never descended into.
pub const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    "__pycache__",
    "venv",
    ".venv",
    "node_modules",
    ".tox",
    "build",
    "dist",
];

/// Expand `paths` into the sorted, deduplicated list of Python files.
///
/// Files named explicitly are kept whatever their extension. Directories are
/// walked for `*.py`, skipping [`EXCLUDED_DIRS`]; symlinks are not followed.
pub fn collect_python_files<P: AsRef<Path>>(paths: &[P]) -> FileResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for root in paths {
        let root = root.as_ref();
        if root.is_file() {
            files.push(root.to_path_buf());
            continue;
        }
        if !root.is_dir() {
            return Err(FileError::NotFound {
                path: root.display().to_string(),
            });
        }

        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_excluded(entry));
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                FileError::io(&path, io::Error::other(e.to_string()))
            })?;
            if entry.file_type().is_file() && is_python(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn is_excluded(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| EXCLUDED_DIRS.contains(&name))
}

fn is_python(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "py")
}

// ============================================================================
// Reading and Writing
// ============================================================================

/// Read `path` as UTF-8 text.
pub fn read_source(path: &Path) -> FileResult<String> {
    let bytes = fs::read(path).map_err(|e| FileError::io(path, e))?;
    String::from_utf8(bytes).map_err(|e| FileError::Decode {
        path: path.display().to_string(),
        message: e.utf8_error().to_string(),
    })
}

/// Overwrite `path` with `contents`.
pub fn write_source(path: &Path, contents: &str) -> FileResult<()> {
    fs::write(path, contents).map_err(|e| FileError::io(path, e))
}

// ============================================================================
// Tests
// ============================================================================
