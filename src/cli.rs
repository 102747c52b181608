//! Batch driver: one engine, many files.
//!
//! Files are independent: each gets its own token stream, tree and
//! [`FileContext`](tugup_python::context::FileContext), so they are rewritten
//! in parallel with rayon and no synchronization beyond collecting reports.
//!
//! ## Outcomes
//!
//! | Outcome | Cause | Logged at |
//! |---------|-------|-----------|
//! | `unchanged` | no rule matched | - |
//! | `rewritten` | edits applied (written, reported or diffed per [`Mode`]) | info |
//! | `skipped` | the file does not tokenize or parse | debug |
//! | `error` | not UTF-8, I/O failure, or a rule/edit contract violation | warn/error |

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, error, info, info_span, warn};
use tugup_core::diff::unified_diff;
use tugup_core::error::TugupError;
use tugup_core::output::{emit_response, FileReport, FileStatus, RunResponse};
use tugup_python::files::{collect_python_files, read_source, write_source};
use tugup_python::Engine;

use crate::config::RunConfig;
use crate::error_bridges::rewrite_failed;

// ============================================================================
// Options
// ============================================================================

/// What to do with a file that would change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Overwrite the file.
    Write,
    /// Only report it.
    Check,
    /// Report it with a unified diff.
    Diff,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Write => "write",
            Mode::Check => "check",
            Mode::Diff => "diff",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format for run results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per changed file, then a summary.
    Text,
    /// A single JSON document.
    Json,
}

/// Everything a run needs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub paths: Vec<PathBuf>,
    pub config: RunConfig,
    pub mode: Mode,
}

// ============================================================================
// Running
// ============================================================================

/// Rewrite every Python file under `options.paths`.
///
/// Per-file failures are reported in the response; only argument, config
/// and path-resolution problems fail the run itself.
pub fn run(options: &RunOptions) -> Result<RunResponse, TugupError> {
    let registry = options.config.registry()?;
    let engine = Engine::new(&registry, options.config.engine.clone());
    let files = collect_python_files(&options.paths)?;

    let target = engine.config().target;
    info!(
        files = files.len(),
        rules = engine.active_rules().len(),
        target = %target,
        mode = %options.mode,
        "starting run"
    );

    let reports: Vec<FileReport> = files
        .par_iter()
        .map(|path| process_file(&engine, path, options.mode))
        .collect();

    Ok(RunResponse::new(target.to_string(), options.mode.as_str(), reports))
}

/// Rewrite one file according to `mode`.
pub fn process_file(engine: &Engine, path: &Path, mode: Mode) -> FileReport {
    let span = info_span!("file", path = %path.display());
    let _guard = span.enter();
    let display = path.display().to_string();

    let source = match read_source(path) {
        Ok(source) => source,
        Err(e) => {
            let err = TugupError::from(e);
            warn!(error = %err, "cannot read file");
            return FileReport::failed(display, &err);
        }
    };

    let rewrite = match engine.rewrite(&source, Some(path)) {
        Ok(rewrite) => rewrite,
        Err(e) if e.is_recoverable() => {
            debug!(reason = %e, "skipping file");
            return FileReport::skipped(display, e.to_string());
        }
        Err(e) => {
            let err = rewrite_failed(path, &e);
            error!(error = %err, "rewrite failed, file left unmodified");
            return FileReport::failed(display, &err);
        }
    };

    if !rewrite.is_changed(&source) {
        return FileReport::unchanged(display);
    }

    let report = FileReport::rewritten(display.as_str(), rewrite.edits);
    match mode {
        Mode::Write => {
            if let Err(e) = write_source(path, &rewrite.output) {
                let err = TugupError::from(e);
                warn!(error = %err, "cannot write file");
                return FileReport::failed(display, &err);
            }
            info!(edits = rewrite.edits, "rewrote file");
            report
        }
        Mode::Check => report,
        Mode::Diff => report.with_diff(unified_diff(&display, &source, &rewrite.output)),
    }
}

// ============================================================================
// Rule Listing
// ============================================================================

/// One line of `--list-rules`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleListing {
    pub name: &'static str,
    pub min_version: String,
    /// Eligible at the configured target.
    pub active: bool,
}

/// Rules selected by `only`/`skip`, with their gates.
pub fn list_rules(config: &RunConfig) -> Result<Vec<RuleListing>, TugupError> {
    let registry = config.registry()?;
    Ok(registry
        .rules()
        .into_iter()
        .map(|rule| RuleListing {
            name: rule.name,
            min_version: rule.min_version.to_string(),
            active: rule.min_version <= config.engine.target,
        })
        .collect())
}

// ============================================================================
// Output
// ============================================================================

/// Write a run response in `format`.
pub fn write_run(
    response: &RunResponse,
    format: OutputFormat,
    writer: &mut impl Write,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => emit_response(response, writer),
        OutputFormat::Text => write_run_text(response, writer),
    }
}

fn write_run_text(response: &RunResponse, writer: &mut impl Write) -> io::Result<()> {
    for file in &response.files {
        match file.status {
            FileStatus::Rewritten => match (&file.diff, response.mode.as_str()) {
                (Some(diff), _) => write!(writer, "{}", diff)?,
                (None, "write") => writeln!(writer, "Rewriting {}", file.path)?,
                (None, _) => writeln!(writer, "Would rewrite {}", file.path)?,
            },
            FileStatus::Error => {
                let message = file.error.as_ref().map_or("", |e| e.message.as_str());
                writeln!(writer, "Error {}: {}", file.path, message)?;
            }
            FileStatus::Unchanged | FileStatus::Skipped => {}
        }
    }

    let s = &response.summary;
    writeln!(
        writer,
        "{} scanned, {} rewritten, {} unchanged, {} skipped, {} failed",
        s.files_scanned, s.files_rewritten, s.files_unchanged, s.files_skipped, s.files_errored
    )
}

/// Write the rule listing in `format`.
pub fn write_rules(
    rules: &[RuleListing],
    format: OutputFormat,
    writer: &mut impl Write,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => emit_response(&rules, writer),
        OutputFormat::Text => {
            for rule in rules {
                let note = if rule.active { "" } else { "  (inactive)" };
                writeln!(writer, "{:<20} {}{}", rule.name, rule.min_version, note)?;
            }
            Ok(())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
