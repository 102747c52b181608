//! Version-gated rule registry and dispatch table.
//!
//! Rules are registered explicitly into a [`RuleRegistry`] by the entry point
//! (see [`crate::rules::builtin_rules`]). Before a run, the registry is
//! compiled against the target version into a [`DispatchTable`]: handlers
//! whose minimum version exceeds the target are left out entirely, and the
//! rest are indexed by [`NodeKind`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tugup_core::patch::ScheduledEdit;
use tugup_core::text::Position;

use crate::context::FileContext;
use crate::tree::{NodeKind, SyntaxNode};
use crate::version::TargetVersion;

// ============================================================================
// Handler Types
// ============================================================================

/// A handler found a node whose shape it cannot handle safely.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("unexpected {kind} shape at {position}: {message}")]
    UnexpectedShape {
        kind: &'static str,
        position: Position,
        message: String,
    },

    /// The node needs rewriting but sits where tokens cannot be edited.
    #[error("cannot rewrite {kind} at {position}: {message}")]
    Unrewritable {
        kind: &'static str,
        position: Position,
        message: String,
    },
}

impl RuleError {
    pub fn unexpected(node: SyntaxNode<'_>, message: impl Into<String>) -> Self {
        RuleError::UnexpectedShape {
            kind: node.grammar_kind(),
            position: node.position(),
            message: message.into(),
        }
    }

    pub fn unrewritable(node: SyntaxNode<'_>, message: impl Into<String>) -> Self {
        RuleError::Unrewritable {
            kind: node.grammar_kind(),
            position: node.position(),
            message: message.into(),
        }
    }
}

/// Edits yielded by one handler invocation.
pub type HandlerResult = Result<Vec<ScheduledEdit>, RuleError>;

/// A structural pattern handler: `(context, node, parent) -> edits`.
pub type Handler = Box<
    dyn for<'t> Fn(&mut FileContext, SyntaxNode<'t>, Option<SyntaxNode<'t>>) -> HandlerResult
        + Send
        + Sync,
>;

/// A handler together with the rule that owns it.
pub struct RegisteredHandler {
    pub rule: &'static str,
    pub kind: NodeKind,
    pub min_version: TargetVersion,
    handler: Handler,
}

impl RegisteredHandler {
    pub fn call<'t>(
        &self,
        ctx: &mut FileContext,
        node: SyntaxNode<'t>,
        parent: Option<SyntaxNode<'t>>,
    ) -> HandlerResult {
        (self.handler)(ctx, node, parent)
    }
}

impl fmt::Debug for RegisteredHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredHandler")
            .field("rule", &self.rule)
            .field("kind", &self.kind)
            .field("min_version", &self.min_version)
            .finish_non_exhaustive()
    }
}

/// Name and gate of a registered rule, for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RuleInfo {
    pub name: &'static str,
    pub min_version: TargetVersion,
}

// ============================================================================
// Registry
// ============================================================================

/// Handlers grouped by minimum version, in registration order.
#[derive(Debug, Default)]
pub struct RuleRegistry {
    by_version: BTreeMap<TargetVersion, Vec<Arc<RegisteredHandler>>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for nodes of `kind`, active from `min_version` on.
    pub fn register<F>(
        &mut self,
        rule: &'static str,
        min_version: TargetVersion,
        kind: NodeKind,
        handler: F,
    ) where
        F: for<'t> Fn(&mut FileContext, SyntaxNode<'t>, Option<SyntaxNode<'t>>) -> HandlerResult
            + Send
            + Sync
            + 'static,
    {
        self.by_version
            .entry(min_version)
            .or_default()
            .push(Arc::new(RegisteredHandler {
                rule,
                kind,
                min_version,
                handler: Box::new(handler),
            }));
    }

    /// Every registered rule, ordered by name.
    pub fn rules(&self) -> Vec<RuleInfo> {
        let mut rules: Vec<RuleInfo> = self
            .handlers()
            .map(|h| RuleInfo {
                name: h.rule,
                min_version: h.min_version,
            })
            .collect();
        rules.sort();
        rules.dedup();
        rules
    }

    pub fn contains_rule(&self, name: &str) -> bool {
        self.handlers().any(|h| h.rule == name)
    }

    /// Drop every handler whose rule does not satisfy `keep`.
    pub fn retain_rules(&mut self, mut keep: impl FnMut(&str) -> bool) {
        for handlers in self.by_version.values_mut() {
            handlers.retain(|h| keep(h.rule));
        }
        self.by_version.retain(|_, handlers| !handlers.is_empty());
    }

    pub fn is_empty(&self) -> bool {
        self.by_version.is_empty()
    }

    /// Compile the handlers eligible at `target` into a kind-indexed table.
    pub fn dispatch(&self, target: TargetVersion) -> DispatchTable {
        let mut by_kind: HashMap<NodeKind, Vec<Arc<RegisteredHandler>>> = HashMap::new();
        for handlers in self.by_version.range(..=target).map(|(_, h)| h) {
            for handler in handlers {
                by_kind
                    .entry(handler.kind)
                    .or_default()
                    .push(Arc::clone(handler));
            }
        }
        DispatchTable { target, by_kind }
    }

    fn handlers(&self) -> impl Iterator<Item = &Arc<RegisteredHandler>> {
        self.by_version.values().flatten()
    }
}

// ============================================================================
// Dispatch Table
// ============================================================================

/// Handlers eligible for one target version, indexed by node kind.
#[derive(Debug, Clone)]
pub struct DispatchTable {
    target: TargetVersion,
    by_kind: HashMap<NodeKind, Vec<Arc<RegisteredHandler>>>,
}

impl DispatchTable {
    pub fn target(&self) -> TargetVersion {
        self.target
    }

    /// Handlers for `kind`, lowest minimum version first, then in
    /// registration order.
    pub fn handlers(&self, kind: NodeKind) -> &[Arc<RegisteredHandler>] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }

    /// Number of eligible handlers across all kinds.
    pub fn len(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }
}

// ============================================================================
// Tests
// ============================================================================
