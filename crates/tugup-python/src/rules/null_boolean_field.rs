//! `models.NullBooleanField(...)` to `models.BooleanField(null=True, ...)`,
//! for the deprecation in Django 3.1.

use tugup_core::patch::ScheduledEdit;

use crate::context::FileContext;
use crate::edits::insert_argument;
use crate::registry::{HandlerResult, RuleRegistry};
use crate::rules::{in_interpolation, is_name};
use crate::tree::{NodeKind, SyntaxNode};
use crate::version::TargetVersion;

const RULE: &str = "null_boolean_field";
const MIN_VERSION: TargetVersion = TargetVersion::new(3, 1);

pub(super) fn register(registry: &mut RuleRegistry) {
    registry.register(RULE, MIN_VERSION, NodeKind::Call, call);
}

fn call<'t>(
    ctx: &mut FileContext,
    node: SyntaxNode<'t>,
    _: Option<SyntaxNode<'t>>,
) -> HandlerResult {
    if !ctx.imports().contains(&ctx.framework_module("db"), "models") || in_interpolation(node) {
        return Ok(Vec::new());
    }
    let Some(function) = node.child_by_field("function") else {
        return Ok(Vec::new());
    };
    let is_field = function.is(NodeKind::Attribute)
        && function
            .child_by_field("object")
            .is_some_and(|o| is_name(o, "models"));
    let Some(name) = function
        .child_by_field("attribute")
        .filter(|a| is_field && is_name(*a, "NullBooleanField"))
    else {
        return Ok(Vec::new());
    };

    let Some(arguments) = node
        .child_by_field("arguments")
        .filter(|a| a.is(NodeKind::ArgumentList))
    else {
        return Ok(Vec::new());
    };
    let args = arguments.children();
    // **kwargs may already carry `null`; leave those calls for a human
    if args.iter().any(|arg| arg.is(NodeKind::DictionarySplat)) {
        return Ok(Vec::new());
    }
    let has_null = args.iter().any(|arg| {
        arg.is(NodeKind::KeywordArgument)
            && arg
                .child_by_field("name")
                .is_some_and(|n| n.text() == "null")
    });
    // after the positional arguments, before the first keyword
    let insert_at = args
        .iter()
        .position(|arg| arg.is(NodeKind::KeywordArgument))
        .unwrap_or(args.len());

    let name_position = name.position();
    let open_position = arguments.position();
    Ok(vec![ScheduledEdit::new(node.position(), move |stream, i| {
        let name = stream.find_by_position(i, name_position)?;
        stream.replace(name, "BooleanField")?;
        if !has_null {
            let open = stream.find_by_position(name, open_position)?;
            insert_argument(stream, open, insert_at, "null=True")?;
        }
        Ok(())
    })])
}
