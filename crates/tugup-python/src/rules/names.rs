//! Renaming names that a framework module moved or deprecated.

use std::collections::{BTreeMap, HashSet};

use tugup_core::patch::ScheduledEdit;

use crate::context::FileContext;
use crate::edits::{replace_token, update_import_names, ImportFromShape};
use crate::registry::{HandlerResult, RuleError, RuleRegistry};
use crate::rules::{in_interpolation, is_bare_name};
use crate::tree::{NodeKind, SyntaxNode};
use crate::version::TargetVersion;

/// Function and class names defined in the file so far.
#[derive(Debug, Default)]
struct LocalDefinitions(HashSet<String>);

/// A set of `old -> new` renames of names importable from one module.
///
/// Rewrites `from <module> import old` into `from <module> import new`, and
/// every later bare use of `old` into `new`. When `new` is already imported
/// the `old` import is removed instead. Uses are only rewritten when `old`
/// was imported from `module` above them and the file does not define a
/// function or class of the same name.
///
/// A use inside an f-string interpolation cannot be renamed, so it fails the
/// file rather than leaving the import and the use out of step.
#[derive(Debug)]
pub struct NameRenames {
    pub rule: &'static str,
    pub min_version: TargetVersion,
    /// Module path under the framework namespace, e.g. `"utils.encoding"`.
    pub submodule: &'static str,
    pub renames: &'static [(&'static str, &'static str)],
}

impl NameRenames {
    pub fn register(&'static self, registry: &mut RuleRegistry) {
        registry.register(
            self.rule,
            self.min_version,
            NodeKind::ImportFrom,
            move |ctx, node, _| self.rewrite_import(ctx, node),
        );
        registry.register(
            self.rule,
            self.min_version,
            NodeKind::Identifier,
            move |ctx, node, parent| self.rewrite_use(ctx, node, parent),
        );
        for kind in [NodeKind::FunctionDefinition, NodeKind::ClassDefinition] {
            registry.register(self.rule, self.min_version, kind, record_definition);
        }
    }

    fn new_name(&self, old: &str) -> Option<&'static str> {
        self.renames
            .iter()
            .find(|(from, _)| *from == old)
            .map(|(_, to)| *to)
    }

    fn rewrite_import(&self, ctx: &mut FileContext, node: SyntaxNode<'_>) -> HandlerResult {
        let Some(shape) = ImportFromShape::from_node(node) else {
            return Ok(Vec::new());
        };
        let module = ctx.framework_module(self.submodule);
        if shape.module.as_deref() != Some(module.as_str()) {
            return Ok(Vec::new());
        }

        let mut name_map = BTreeMap::new();
        for alias in &shape.aliases {
            let Some(new) = self.new_name(&alias.name) else {
                continue;
            };
            let replacement = if alias.alias.is_some() {
                new
            } else {
                let duplicate = shape.unaliased_names().any(|name| name == new)
                    || ctx.imports().contains(&module, new)
                    || ctx.imports().contains(&module, &alias.name);
                if duplicate {
                    ""
                } else {
                    new
                }
            };
            name_map.insert(alias.name.clone(), replacement.to_string());
        }

        if name_map.is_empty() {
            return Ok(Vec::new());
        }
        let position = shape.start;
        Ok(vec![ScheduledEdit::new(position, move |stream, i| {
            update_import_names(stream, i, &shape, &name_map)
        })])
    }

    fn rewrite_use(
        &self,
        ctx: &mut FileContext,
        node: SyntaxNode<'_>,
        parent: Option<SyntaxNode<'_>>,
    ) -> HandlerResult {
        let name = node.text();
        let Some(new) = self.new_name(name) else {
            return Ok(Vec::new());
        };
        let shadowed = ctx
            .scratch_ref::<LocalDefinitions>()
            .is_some_and(|defs| defs.0.contains(name));
        let imported = ctx
            .imports()
            .contains(&ctx.framework_module(self.submodule), name);
        if shadowed || !imported || !is_bare_name(node, parent) {
            return Ok(Vec::new());
        }
        if in_interpolation(node) {
            return Err(RuleError::unrewritable(
                node,
                format!("`{}` is used inside an f-string", name),
            ));
        }
        Ok(vec![replace_token(node.position(), new)])
    }
}

fn record_definition<'t>(
    ctx: &mut FileContext,
    node: SyntaxNode<'t>,
    _: Option<SyntaxNode<'t>>,
) -> HandlerResult {
    if let Some(name) = node.child_by_field("name") {
        ctx.scratch::<LocalDefinitions>()
            .0
            .insert(name.text().to_string());
    }
    Ok(Vec::new())
}
