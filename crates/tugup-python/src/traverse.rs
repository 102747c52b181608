//! Depth-first walk that runs handlers and accumulates import state.
//!
//! The walk uses an explicit stack of `(node, parent)` pairs seeded with the
//! root. Children are pushed in reverse so the leftmost child is visited
//! next, giving pre-order, left-to-right traversal without recursion.
//!
//! At each node every handler the [`DispatchTable`] lists for the node's
//! kind runs first; then, if the node is an absolute `from X import ...`
//! inside the tracked namespace, its unaliased names are added to the
//! context's [`ImportState`](crate::context::ImportState). Handlers on an
//! import statement therefore see the state from *before* that statement.

use tracing::debug;
use tugup_core::patch::EditMap;

use crate::context::FileContext;
use crate::edits::ImportFromShape;
use crate::registry::DispatchTable;
use crate::rewrite::RewriteError;
use crate::tree::{NodeKind, SyntaxNode, SyntaxTree};

/// Walk `tree`, returning every edit the eligible handlers scheduled.
pub fn collect_edits(
    tree: &SyntaxTree,
    table: &DispatchTable,
    ctx: &mut FileContext,
) -> Result<EditMap, RewriteError> {
    let mut edits = EditMap::new();
    let mut stack: Vec<(SyntaxNode<'_>, Option<SyntaxNode<'_>>)> = vec![(tree.root(), None)];

    while let Some((node, parent)) = stack.pop() {
        for handler in table.handlers(node.kind()) {
            let scheduled = handler
                .call(ctx, node, parent)
                .map_err(|source| RewriteError::Rule {
                    rule: handler.rule,
                    source,
                })?;
            for edit in scheduled {
                debug!(rule = handler.rule, position = %edit.position, "scheduled edit");
                edits.push(edit);
            }
        }

        if node.is(NodeKind::ImportFrom) {
            record_import(ctx, node);
        }

        let children = node.children();
        stack.extend(children.into_iter().rev().map(|child| (child, Some(node))));
    }

    Ok(edits)
}

fn record_import(ctx: &mut FileContext, node: SyntaxNode<'_>) {
    let Some(shape) = ImportFromShape::from_node(node) else {
        return;
    };
    let Some(module) = shape.module.as_deref() else {
        return;
    };
    if !ctx.in_namespace(module) {
        return;
    }
    let names: Vec<String> = shape.unaliased_names().map(str::to_string).collect();
    ctx.imports_mut().record(module, names);
}

// ============================================================================
// Tests
// ============================================================================
