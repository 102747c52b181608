//! Run configuration: `tugup.toml` merged with command-line overrides.
//!
//! Precedence, highest first: command-line flags (and `TUGUP_TARGET_VERSION`,
//! which clap folds into `--target-version`), the config file, built-in
//! defaults. The config file is the one named by `--config`, else
//! `tugup.toml` in the current directory when it exists.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;
use tugup_core::error::TugupError;
use tugup_python::registry::RuleRegistry;
use tugup_python::rules::builtin_rules;
use tugup_python::{EngineConfig, TargetVersion};

/// Config file looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "tugup.toml";

// ============================================================================
// File Config
// ============================================================================

/// Contents of a `tugup.toml` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub target_version: Option<TargetVersion>,
    pub namespace: Option<String>,
    #[serde(default)]
    pub only: Vec<String>,
    #[serde(default)]
    pub skip: Vec<String>,
}

impl FileConfig {
    pub fn parse(text: &str, path: &Path) -> Result<Self, TugupError> {
        toml::from_str(text).map_err(|e| TugupError::InvalidConfig {
            path: path.display().to_string(),
            message: e.message().to_string(),
        })
    }

    /// Load the explicit config file, or `tugup.toml` under `dir` if present.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self, TugupError> {
        let path: PathBuf = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = dir.join(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    return Ok(FileConfig::default());
                }
                fallback
            }
        };
        debug!(path = %path.display(), "loading config");
        let text = fs::read_to_string(&path).map_err(|e| TugupError::InvalidConfig {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        FileConfig::parse(&text, &path)
    }
}

// ============================================================================
// Effective Config
// ============================================================================

/// Values given on the command line; `None`/empty means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub target_version: Option<TargetVersion>,
    pub namespace: Option<String>,
    pub only: Vec<String>,
    pub skip: Vec<String>,
}

/// Settings for one run after merging every source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub engine: EngineConfig,
    pub only: Vec<String>,
    pub skip: Vec<String>,
}

impl RunConfig {
    pub fn merge(file: FileConfig, overrides: Overrides) -> Self {
        let defaults = EngineConfig::default();
        let pick = |cli: Vec<String>, file: Vec<String>| if cli.is_empty() { file } else { cli };
        RunConfig {
            engine: EngineConfig {
                target: overrides
                    .target_version
                    .or(file.target_version)
                    .unwrap_or(defaults.target),
                namespace: overrides
                    .namespace
                    .or(file.namespace)
                    .unwrap_or(defaults.namespace),
            },
            only: pick(overrides.only, file.only),
            skip: pick(overrides.skip, file.skip),
        }
    }

    /// The built-in rules narrowed by `only` and `skip`.
    ///
    /// Unknown rule names are rejected rather than ignored.
    pub fn registry(&self) -> Result<RuleRegistry, TugupError> {
        let mut registry = builtin_rules();
        let unknown: Vec<&str> = self
            .only
            .iter()
            .chain(&self.skip)
            .map(String::as_str)
            .filter(|name| !registry.contains_rule(name))
            .collect();
        if !unknown.is_empty() {
            let known: Vec<&str> = registry.rules().iter().map(|r| r.name).collect();
            return Err(TugupError::invalid_args_with_details(
                format!("unknown rule: {}", unknown.join(", ")),
                serde_json::json!({ "known_rules": known }),
            ));
        }

        registry.retain_rules(|name| {
            (self.only.is_empty() || self.only.iter().any(|o| o == name))
                && !self.skip.iter().any(|s| s == name)
        });
        Ok(registry)
    }
}

// ============================================================================
// Tests
// ============================================================================
