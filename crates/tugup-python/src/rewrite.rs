//! Per-file rewrite pipeline.
//!
//! ```text
//! source ─┬─ lex ──── TokenStream (dedent-normalized) ───────┐
//!         └─ parse ── SyntaxTree ── traverse ── EditMap ──── apply ── serialize
//! ```
//!
//! Lexing and parsing both happen before any edit is computed, so a file
//! either rewrites completely or not at all.

use std::path::Path;

use thiserror::Error;
use tracing::debug;
use tugup_core::patch::apply_edits;
use tugup_core::stream::{TokenError, TokenStream};
use tugup_core::tokenizer::LexError;

use crate::context::FileContext;
use crate::registry::{DispatchTable, RuleError, RuleInfo, RuleRegistry};
use crate::rules::builtin_rules;
use crate::traverse::collect_edits;
use crate::tree::{parse, SyntaxError};
use crate::version::TargetVersion;

const BOM: char = '\u{feff}';

// ============================================================================
// Errors
// ============================================================================

/// Why a file could not be rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    #[error("tokenize failed: {0}")]
    Lex(#[from] LexError),

    #[error("parse failed: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("rule {rule} failed: {source}")]
    Rule {
        rule: &'static str,
        #[source]
        source: RuleError,
    },

    #[error("edit failed: {0}")]
    Edit(#[from] TokenError),
}

impl RewriteError {
    /// Files that do not lex or parse are left alone without complaint.
    ///
    /// Rule and edit failures mean a rule's structural check let through a
    /// shape its edit cannot handle; those are reported.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RewriteError::Lex(_) | RewriteError::Syntax(_))
    }

    /// Name of the failing rule, when one is known.
    pub fn rule(&self) -> Option<&'static str> {
        match self {
            RewriteError::Rule { rule, .. } => Some(*rule),
            _ => None,
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Library-level settings for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub target: TargetVersion,
    /// Framework package whose imports are tracked.
    pub namespace: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            target: TargetVersion::default(),
            namespace: "django".to_string(),
        }
    }
}

/// Result of rewriting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub output: String,
    /// Number of edit callbacks applied.
    pub edits: usize,
}

impl Rewrite {
    pub fn is_changed(&self, source: &str) -> bool {
        self.output != source
    }
}

/// A dispatch table compiled for one target, reusable across files.
///
/// `Engine` is `Sync`; one instance is shared by every worker of a run.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    table: DispatchTable,
    rules: Vec<RuleInfo>,
}

impl Engine {
    pub fn new(registry: &RuleRegistry, config: EngineConfig) -> Self {
        let table = registry.dispatch(config.target);
        let rules = registry
            .rules()
            .into_iter()
            .filter(|rule| rule.min_version <= config.target)
            .collect();
        Engine {
            config,
            table,
            rules,
        }
    }

    /// Engine over every built-in rule.
    pub fn with_builtin_rules(config: EngineConfig) -> Self {
        Engine::new(&builtin_rules(), config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rules eligible at the configured target.
    pub fn active_rules(&self) -> &[RuleInfo] {
        &self.rules
    }

    /// Rewrite `source`. `path` is exposed to rules that gate on file names.
    pub fn rewrite(&self, source: &str, path: Option<&Path>) -> Result<Rewrite, RewriteError> {
        let (bom, body) = match source.strip_prefix(BOM) {
            Some(stripped) => (true, stripped),
            None => (false, source),
        };

        let mut stream = TokenStream::from_source(body)?;
        let tree = parse(body)?;

        if self.table.is_empty() {
            return Ok(Rewrite {
                output: source.to_string(),
                edits: 0,
            });
        }

        let mut ctx = FileContext::new(self.config.namespace.as_str(), path);
        let edits = collect_edits(&tree, &self.table, &mut ctx)?;
        if edits.is_empty() {
            return Ok(Rewrite {
                output: source.to_string(),
                edits: 0,
            });
        }

        debug!(scheduled = edits.len(), "applying edits");
        let applied = apply_edits(&mut stream, edits)?;

        let mut output = String::with_capacity(source.len());
        if bom {
            output.push(BOM);
        }
        output.push_str(&stream.to_source());
        Ok(Rewrite {
            output,
            edits: applied,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(target: &str) -> Engine {
        Engine::with_builtin_rules(EngineConfig {
            target: target.parse().unwrap(),
            ..EngineConfig::default()
        })
    }

    #[test]
    fn default_config_targets_django_2_2() {
        let config = EngineConfig::default();
        assert_eq!(config.target, TargetVersion::new(2, 2));
        assert_eq!(config.namespace, "django");
    }

    #[test]
    fn active_rules_follow_target() {
        let names = |e: &Engine| e.active_rules().iter().map(|r| r.name).collect::<Vec<_>>();
        assert_eq!(
            names(&engine("2.2")),
            vec!["queryset_paginator", "request_headers"]
        );
        assert_eq!(names(&engine("3.2")).len(), 5);
        assert!(names(&engine("1.11")).is_empty());
    }

    #[test]
    fn rewrite_preserves_bom() {
        let source = "\u{feff}from django.utils.encoding import force_text\n";
        let rewrite = engine("3.0").rewrite(source, None).unwrap();
        assert_eq!(
            rewrite.output,
            "\u{feff}from django.utils.encoding import force_str\n"
        );
        assert_eq!(rewrite.edits, 1);
        assert!(rewrite.is_changed(source));
    }

    #[test]
    fn lex_and_syntax_errors_are_recoverable() {
        let e = engine("3.2");
        let lex = e.rewrite("x = 'open\n", None).unwrap_err();
        assert!(matches!(lex, RewriteError::Lex(_)));
        assert!(lex.is_recoverable());

        let syntax = e.rewrite("x = = 1\n", None).unwrap_err();
        assert!(matches!(syntax, RewriteError::Syntax(_)));
        assert!(syntax.is_recoverable());
    }

    #[test]
    fn contract_violations_are_not_recoverable() {
        let edit = RewriteError::Edit(TokenError::OutOfRange { index: 9, len: 3 });
        assert!(!edit.is_recoverable());
        assert_eq!(edit.rule(), None);
    }

    #[test]
    fn untouched_source_is_returned_verbatim() {
        let source = "x = 1  # note\r\nif y:\r\n\tpass\r\n";
        let rewrite = engine("3.2").rewrite(source, None).unwrap();
        assert_eq!(rewrite.output, source);
        assert_eq!(rewrite.edits, 0);
    }
}
