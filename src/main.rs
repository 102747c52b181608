//! Binary entry point for the tugup CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Upgrade a project in place for Django 3.2
//! tugup --target-version 3.2 src/
//!
//! # Report what would change, exit 1 if anything would
//! tugup --check src/
//!
//! # Print unified diffs instead of writing
//! tugup --diff --only request_headers app/views.py
//!
//! # Show the built-in rules and their version gates
//! tugup --list-rules
//! ```
//!
//! ## Exit codes
//!
//! `0` nothing changed (or would change), `1` files were rewritten or could
//! not be processed, `2` invalid arguments or config, `3` a path does not
//! exist, `10` internal error.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use tugup::cli::{list_rules, run, write_rules, write_run, Mode, OutputFormat, RunOptions};
use tugup::config::{FileConfig, Overrides, RunConfig};
use tugup_core::error::{OutputErrorCode, TugupError};
use tugup_core::output::{emit_response, ErrorResponse};
use tugup_python::TargetVersion;

/// Version-gated Django upgrades that rewrite only the tokens they must.
#[derive(Parser, Debug)]
#[command(
    name = "tugup",
    version,
    about = "Upgrade Django code for a target version, touching only what must change"
)]
struct Cli {
    /// Files or directories to upgrade.
    #[arg(required_unless_present = "list_rules")]
    paths: Vec<PathBuf>,

    /// Django version to upgrade to (e.g. 3.2).
    #[arg(long, env = "TUGUP_TARGET_VERSION")]
    target_version: Option<TargetVersion>,

    /// Package Django is imported as; rule module paths are resolved under it.
    #[arg(long)]
    namespace: Option<String>,

    /// Run only this rule (repeatable).
    #[arg(long = "only", value_name = "RULE")]
    only: Vec<String>,

    /// Never run this rule (repeatable).
    #[arg(long = "skip", value_name = "RULE")]
    skip: Vec<String>,

    /// Report files that would change without writing them.
    #[arg(long, conflicts_with = "diff")]
    check: bool,

    /// Print unified diffs without writing.
    #[arg(long)]
    diff: bool,

    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Log level (overridden by RUST_LOG).
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Config file (default: ./tugup.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// List the built-in rules and exit.
    #[arg(long)]
    list_rules: bool,
}

impl Cli {
    fn mode(&self) -> Mode {
        if self.check {
            Mode::Check
        } else if self.diff {
            Mode::Diff
        } else {
            Mode::Write
        }
    }
}

/// Log level for tracing output.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.log_level);

    let format = cli.format;
    match execute(cli) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(1),
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            match format {
                OutputFormat::Json => {
                    let response = ErrorResponse::from_error(&err);
                    let _ = emit_response(&response, &mut io::stdout());
                    let _ = io::stdout().flush();
                }
                OutputFormat::Text => eprintln!("tugup: error: {}", err),
            }
            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the run. Returns whether any file was (or would be) rewritten or failed.
fn execute(cli: Cli) -> Result<bool, TugupError> {
    let cwd = std::env::current_dir().map_err(|e| TugupError::io(".", &e))?;
    let file = FileConfig::load(cli.config.as_deref(), &cwd)?;
    let mode = cli.mode();
    let config = RunConfig::merge(
        file,
        Overrides {
            target_version: cli.target_version,
            namespace: cli.namespace,
            only: cli.only,
            skip: cli.skip,
        },
    );

    let mut stdout = io::stdout();
    if cli.list_rules {
        let rules = list_rules(&config)?;
        write_rules(&rules, cli.format, &mut stdout)
            .map_err(|e| TugupError::internal(e.to_string()))?;
        return Ok(false);
    }

    let options = RunOptions {
        paths: cli.paths,
        config,
        mode,
    };
    let response = run(&options)?;
    write_run(&response, cli.format, &mut stdout)
        .map_err(|e| TugupError::internal(e.to_string()))?;
    Ok(response.summary.is_dirty())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod cli_parsing {
        use super::*;

        #[test]
        fn paths_and_defaults() {
            let cli = Cli::try_parse_from(["tugup", "app/", "manage.py"]).unwrap();
            assert_eq!(
                cli.paths,
                vec![PathBuf::from("app/"), PathBuf::from("manage.py")]
            );
            assert_eq!(cli.mode(), Mode::Write);
            assert_eq!(cli.format, OutputFormat::Text);
            assert!(matches!(cli.log_level, LogLevel::Warn));
            assert!(cli.only.is_empty());
        }

        #[test]
        fn target_version_is_parsed() {
            let cli = Cli::try_parse_from(["tugup", "--target-version", "3.2", "."]).unwrap();
            assert_eq!(cli.target_version, Some(TargetVersion::new(3, 2)));
        }

        #[test]
        fn bad_target_version_is_rejected() {
            let result = Cli::try_parse_from(["tugup", "--target-version", "three", "."]);
            assert!(result.is_err());
        }

        #[test]
        fn paths_required_unless_listing_rules() {
            assert!(Cli::try_parse_from(["tugup"]).is_err());
            let cli = Cli::try_parse_from(["tugup", "--list-rules"]).unwrap();
            assert!(cli.list_rules);
            assert!(cli.paths.is_empty());
        }

        #[test]
        fn only_and_skip_repeat() {
            let cli = Cli::try_parse_from([
                "tugup",
                "--only",
                "request_headers",
                "--only",
                "utils_encoding",
                "--skip",
                "default_app_config",
                "src",
            ])
            .unwrap();
            assert_eq!(cli.only, vec!["request_headers", "utils_encoding"]);
            assert_eq!(cli.skip, vec!["default_app_config"]);
        }

        #[test]
        fn check_and_diff_select_mode() {
            let check = Cli::try_parse_from(["tugup", "--check", "src"]).unwrap();
            assert_eq!(check.mode(), Mode::Check);
            let diff = Cli::try_parse_from(["tugup", "--diff", "src"]).unwrap();
            assert_eq!(diff.mode(), Mode::Diff);
        }

        #[test]
        fn check_conflicts_with_diff() {
            assert!(Cli::try_parse_from(["tugup", "--check", "--diff", "src"]).is_err());
        }

        #[test]
        fn json_format() {
            let cli = Cli::try_parse_from(["tugup", "--format", "json", "src"]).unwrap();
            assert_eq!(cli.format, OutputFormat::Json);
        }
    }

    mod log_level {
        use super::*;

        #[test]
        fn maps_to_tracing_levels() {
            assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
            assert_eq!(LogLevel::Info.to_tracing_level(), tracing::Level::INFO);
            assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
        }
    }
}
