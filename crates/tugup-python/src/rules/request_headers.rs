//! `request.META["HTTP_*"]` lookups to the `request.headers` mapping added in
//! Django 2.2.

use crate::context::FileContext;
use crate::edits::replace_token;
use crate::registry::{HandlerResult, RuleRegistry};
use crate::rules::{in_interpolation, is_name, simple_string};
use crate::tree::{NodeKind, SyntaxNode};
use crate::version::TargetVersion;

const RULE: &str = "request_headers";
const MIN_VERSION: TargetVersion = TargetVersion::new(2, 2);

/// `META` keys that are exposed as headers without the `HTTP_` prefix.
const UNPREFIXED: &[&str] = &["CONTENT_LENGTH", "CONTENT_TYPE"];

pub(super) fn register(registry: &mut RuleRegistry) {
    registry.register(RULE, MIN_VERSION, NodeKind::Subscript, subscript);
    registry.register(RULE, MIN_VERSION, NodeKind::Call, get_call);
}

/// `request.META["HTTP_ACCEPT"]`
fn subscript<'t>(
    _: &mut FileContext,
    node: SyntaxNode<'t>,
    parent: Option<SyntaxNode<'t>>,
) -> HandlerResult {
    let Some(meta) = node.child_by_field("value").and_then(request_meta) else {
        return Ok(Vec::new());
    };
    if is_store_target(node, parent) || in_interpolation(node) {
        return Ok(Vec::new());
    }
    let keys = node.children_by_field("subscript");
    let [key] = keys.as_slice() else {
        return Ok(Vec::new());
    };
    rewrite(meta, *key)
}

/// `request.META.get("HTTP_ACCEPT"[, default])`
fn get_call<'t>(
    _: &mut FileContext,
    node: SyntaxNode<'t>,
    _: Option<SyntaxNode<'t>>,
) -> HandlerResult {
    let Some(function) = node.child_by_field("function") else {
        return Ok(Vec::new());
    };
    if !function.is(NodeKind::Attribute)
        || !function
            .child_by_field("attribute")
            .is_some_and(|a| is_name(a, "get"))
    {
        return Ok(Vec::new());
    }
    let Some(meta) = function.child_by_field("object").and_then(request_meta) else {
        return Ok(Vec::new());
    };
    if in_interpolation(node) {
        return Ok(Vec::new());
    }

    let args = node
        .child_by_field("arguments")
        .map(|a| a.children())
        .unwrap_or_default();
    let positional = args.iter().all(|arg| {
        !matches!(
            arg.kind(),
            NodeKind::KeywordArgument | NodeKind::ListSplat | NodeKind::DictionarySplat
        )
    });
    if !positional || !(1..=2).contains(&args.len()) {
        return Ok(Vec::new());
    }
    rewrite(meta, args[0])
}

fn rewrite(meta: SyntaxNode<'_>, key: SyntaxNode<'_>) -> HandlerResult {
    let Some((quote, value)) = simple_string(key) else {
        return Ok(Vec::new());
    };
    let Some(header) = header_name(value) else {
        return Ok(Vec::new());
    };
    Ok(vec![
        replace_token(meta.position(), "headers"),
        replace_token(key.position(), format!("{quote}{header}{quote}")),
    ])
}

/// The `META` identifier of `request.META` or `self.request.META`.
fn request_meta(node: SyntaxNode<'_>) -> Option<SyntaxNode<'_>> {
    if !node.is(NodeKind::Attribute) {
        return None;
    }
    let meta = node.child_by_field("attribute").filter(|a| is_name(*a, "META"))?;
    let object = node.child_by_field("object")?;
    let is_request = is_name(object, "request")
        || (object.is(NodeKind::Attribute)
            && object
                .child_by_field("object")
                .is_some_and(|o| is_name(o, "self"))
            && object
                .child_by_field("attribute")
                .is_some_and(|a| is_name(a, "request")));
    is_request.then_some(meta)
}

/// Is the subscript written to? `request.headers` is read-only, so it must
/// not be an assignment, loop or `with ... as` target, even inside a tuple
/// or list of targets, nor be deleted.
fn is_store_target<'t>(node: SyntaxNode<'t>, parent: Option<SyntaxNode<'t>>) -> bool {
    let mut target = node;
    let mut container = parent;
    while let Some(outer) = container.filter(|c| is_target_group(*c)) {
        target = outer;
        container = outer.parent();
    }
    let Some(container) = container else {
        return false;
    };
    match container.kind() {
        NodeKind::Assignment
        | NodeKind::AugmentedAssignment
        | NodeKind::ForStatement
        | NodeKind::ForInClause => target.is_field_of(container, "left"),
        NodeKind::AsPatternTarget | NodeKind::Delete => true,
        _ => false,
    }
}

/// Nodes that group several targets (or parenthesize one).
fn is_target_group(node: SyntaxNode<'_>) -> bool {
    matches!(
        node.kind(),
        NodeKind::PatternList
            | NodeKind::TuplePattern
            | NodeKind::ListPattern
            | NodeKind::ListSplatPattern
            | NodeKind::ExpressionList
            | NodeKind::ParenthesizedExpression
            | NodeKind::Tuple
            | NodeKind::List
    )
}

/// `HTTP_ACCEPT_LANGUAGE` -> `accept-language`.
fn header_name(key: &str) -> Option<String> {
    let name = match key.strip_prefix("HTTP_") {
        Some(rest) => rest,
        None if UNPREFIXED.contains(&key) => key,
        None => return None,
    };
    let well_formed = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_');
    well_formed.then(|| name.to_ascii_lowercase().replace('_', "-"))
}
