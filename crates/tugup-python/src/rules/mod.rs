//! Built-in upgrade rules.
//!
//! Each rule module exposes a `register` function that adds its handlers to
//! a [`RuleRegistry`]; [`builtin_rules`] is the one place they are wired
//! together.

use crate::registry::RuleRegistry;
use crate::tree::{NodeKind, SyntaxNode};

mod default_app_config;
mod names;
mod null_boolean_field;
mod queryset_paginator;
mod request_headers;
mod utils_encoding;

pub use names::NameRenames;

/// Registry holding every built-in rule.
pub fn builtin_rules() -> RuleRegistry {
    let mut registry = RuleRegistry::new();
    queryset_paginator::register(&mut registry);
    request_headers::register(&mut registry);
    utils_encoding::register(&mut registry);
    null_boolean_field::register(&mut registry);
    default_app_config::register(&mut registry);
    registry
}

// ============================================================================
// Shared Matchers
// ============================================================================

/// Is `node` a name reference, as opposed to an attribute, keyword,
/// parameter, import path or definition name?
pub(crate) fn is_bare_name(node: SyntaxNode<'_>, parent: Option<SyntaxNode<'_>>) -> bool {
    let Some(parent) = parent else {
        return true;
    };
    match parent.kind() {
        NodeKind::DottedName
        | NodeKind::AliasedImport
        | NodeKind::Parameters
        | NodeKind::LambdaParameters
        | NodeKind::TypedParameter => false,
        NodeKind::Attribute => !node.is_field_of(parent, "attribute"),
        NodeKind::KeywordArgument
        | NodeKind::DefaultParameter
        | NodeKind::TypedDefaultParameter
        | NodeKind::FunctionDefinition
        | NodeKind::ClassDefinition => !node.is_field_of(parent, "name"),
        _ => true,
    }
}

/// Is `node` inside an f-string `{...}`? The whole f-string is one token, so
/// nothing in there can be edited.
pub(crate) fn in_interpolation(node: SyntaxNode<'_>) -> bool {
    node.ancestors().any(|a| a.is(NodeKind::Interpolation))
}

/// Contents of a plain single-line string literal: no prefix, no escapes,
/// not triple-quoted. Returns the quote character and the contents.
pub(crate) fn simple_string(node: SyntaxNode<'_>) -> Option<(char, &str)> {
    if !node.is(NodeKind::String) {
        return None;
    }
    let text = node.text();
    let quote = text.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let inner = text.strip_prefix(quote)?.strip_suffix(quote)?;
    if inner.contains(quote) || inner.contains('\\') || inner.contains('\n') {
        return None;
    }
    Some((quote, inner))
}

/// Is `node` an `Identifier` spelled `name`?
pub(crate) fn is_name(node: SyntaxNode<'_>, name: &str) -> bool {
    node.is(NodeKind::Identifier) && node.text() == name
}

// ============================================================================
// Test Support
// ============================================================================
