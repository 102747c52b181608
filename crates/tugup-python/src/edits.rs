//! Python-aware edit helpers built on the token primitives.
//!
//! Handlers capture owned data (positions, names) from the tree while it is
//! being walked and move it into the callbacks produced here. Callbacks run
//! later, during patch application, and see only the token stream and the
//! index of their anchor token.

use std::collections::BTreeMap;

use tracing::debug;
use tugup_core::patch::ScheduledEdit;
use tugup_core::stream::{TokenError, TokenStream};
use tugup_core::text::Position;
use tugup_core::tokenizer::TokenKind;

use crate::tree::{NodeKind, SyntaxNode};

// ============================================================================
// Import Shape
// ============================================================================

/// One imported name of a `from X import ...` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportAlias {
    pub name: String,
    pub alias: Option<String>,
    /// Position of the imported name itself.
    pub name_position: Position,
    /// Span of the whole `name [as alias]` clause.
    pub start: Position,
    pub end: Position,
}

/// Owned shape of a `from X import ...` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFromShape {
    /// Absolute module path; `None` for relative imports.
    pub module: Option<String>,
    pub aliases: Vec<ImportAlias>,
    pub wildcard: bool,
    pub start: Position,
    pub end: Position,
}

impl ImportFromShape {
    /// Capture the shape of an `ImportFrom` node.
    pub fn from_node(node: SyntaxNode<'_>) -> Option<Self> {
        if !node.is(NodeKind::ImportFrom) {
            return None;
        }
        let module = node
            .child_by_field("module_name")
            .filter(|m| m.is(NodeKind::DottedName))
            .map(|m| m.text().to_string());

        let mut aliases = Vec::new();
        for name in node.children_by_field("name") {
            let (name_node, alias) = match name.kind() {
                NodeKind::AliasedImport => {
                    let name_node = name.child_by_field("name")?;
                    let alias = name.child_by_field("alias").map(|a| a.text().to_string());
                    (name_node, alias)
                }
                _ => (name, None),
            };
            aliases.push(ImportAlias {
                name: name_node.text().to_string(),
                alias,
                name_position: name_node.position(),
                start: name.position(),
                end: name.end_position(),
            });
        }

        let wildcard = node
            .children()
            .iter()
            .any(|child| child.is(NodeKind::WildcardImport));

        Some(ImportFromShape {
            module,
            aliases,
            wildcard,
            start: node.position(),
            end: node.end_position(),
        })
    }

    /// Names imported without an `as` clause.
    pub fn unaliased_names(&self) -> impl Iterator<Item = &str> {
        self.aliases
            .iter()
            .filter(|a| a.alias.is_none())
            .map(|a| a.name.as_str())
    }
}

// ============================================================================
// Single-Token Edits
// ============================================================================

/// Replace the token at `position` with `text`.
pub fn replace_token(position: Position, text: impl Into<String>) -> ScheduledEdit {
    let text = text.into();
    ScheduledEdit::new(position, move |stream, i| stream.replace(i, text))
}

// ============================================================================
// Statement Removal
// ============================================================================

/// Remove the statement starting at token `start` and ending at `end`.
///
/// - Alone on its line: the whole line goes (indentation and newline).
/// - Only statement of its block: replaced by `pass`.
/// - Sharing its line with other statements: replaced by `pass`.
pub fn erase_node(stream: &mut TokenStream, start: usize, end: Position) -> Result<(), TokenError> {
    let last = stream.find_last_token(start, end)?;

    if !stream.alone_on_line(start, last) {
        debug!(start, last, "statement shares its line, replacing with pass");
        return stream.replace_range(start, last + 1, "pass");
    }

    let newline = last + 1;
    let opens_block = start
        .checked_sub(1)
        .is_some_and(|prev| stream.token(prev).is_ok_and(|t| t.kind == TokenKind::Indent));

    if opens_block {
        if block_ends_after(stream, newline) {
            return stream.replace_range(start, last + 1, "pass");
        }
        // the Indent token keeps supplying the indentation, so the next
        // statement's own leading whitespace has to go with this line
        stream.delete_range(start, newline + 1)?;
        if stream
            .get(start)
            .is_some_and(|t| t.kind == TokenKind::UnimportantWs)
        {
            stream.delete_range(start, start + 1)?;
        }
        return Ok(());
    }

    let line_start = match start.checked_sub(1) {
        Some(prev) if stream.token(prev)?.kind == TokenKind::UnimportantWs => prev,
        _ => start,
    };
    stream.delete_range(line_start, newline + 1)
}

/// Does the block end right after the line break at `newline`?
fn block_ends_after(stream: &TokenStream, newline: usize) -> bool {
    let next = (newline + 1..stream.len()).find(|&i| {
        stream
            .get(i)
            .is_some_and(|t| !matches!(t.kind, TokenKind::Nl | TokenKind::Comment | TokenKind::UnimportantWs))
    });
    next.and_then(|i| stream.get(i))
        .is_none_or(|t| matches!(t.kind, TokenKind::Dedent | TokenKind::EndMarker))
}

// ============================================================================
// Import Rewriting
// ============================================================================

/// Rename or remove names of the `from X import ...` statement at `start`.
///
/// `renames` maps an imported name to its replacement; an empty replacement
/// removes the name along with the comma and whitespace that separate it.
/// Aliased clauses keep their alias. When every name is removed the whole
/// statement is erased with [`erase_node`].
pub fn update_import_names(
    stream: &mut TokenStream,
    start: usize,
    shape: &ImportFromShape,
    renames: &BTreeMap<String, String>,
) -> Result<(), TokenError> {
    let removed = |alias: &ImportAlias| renames.get(&alias.name).is_some_and(String::is_empty);
    if !shape.aliases.is_empty() && shape.aliases.iter().all(removed) {
        return erase_node(stream, start, shape.end);
    }

    for alias in shape.aliases.iter().rev() {
        let Some(new_name) = renames.get(&alias.name) else {
            continue;
        };
        if new_name.is_empty() {
            remove_alias(stream, start, alias)?;
        } else {
            let i = stream.find_by_position(start, alias.name_position)?;
            stream.replace(i, new_name.as_str())?;
        }
    }
    Ok(())
}

fn remove_alias(stream: &mut TokenStream, start: usize, alias: &ImportAlias) -> Result<(), TokenError> {
    let first = stream.find_by_position(start, alias.start)?;
    let last = stream.find_last_token(first, alias.end)?;

    let comma_after = stream
        .next_significant(last + 1)
        .filter(|&i| stream.get(i).is_some_and(|t| t.is_op(",")));

    let Some(comma) = comma_after else {
        // last name: take the separating comma in front of it
        let comma = stream.reverse_find_op(first, ",")?;
        return stream.delete_range(comma, last + 1);
    };

    if stream.alone_on_line(first, comma) {
        // one name per line: drop the line with its indentation
        let line_start = stream.reverse_consume(first, TokenKind::UnimportantWs, None);
        return stream.delete_range(line_start, comma + 2);
    }

    let end = stream.consume(comma, TokenKind::UnimportantWs, None);
    stream.delete_range(first, end + 1)
}

// ============================================================================
// Call Arguments
// ============================================================================

/// Insert `name=` in front of the argument spanning `span`.
///
/// Only the argument's leading token run changes; leading newlines and
/// indentation of a multi-line argument are kept in place.
pub fn insert_keyword(
    stream: &mut TokenStream,
    span: (usize, usize),
    name: &str,
) -> Result<(), TokenError> {
    let first = first_code_in(stream, span)?;
    stream.insert(first, format!("{}=", name))
}

/// Insert `argument` as argument number `index` of the call opened at `open`.
///
/// An `index` past the last argument appends. In a call whose arguments
/// start on their own line, an argument inserted in front of another gets
/// its own line with the same indentation.
pub fn insert_argument(
    stream: &mut TokenStream,
    open: usize,
    index: usize,
    argument: &str,
) -> Result<(), TokenError> {
    let args = stream.parse_call_args(open)?;
    let Some(&span) = args.spans.get(index) else {
        return match args.spans.last() {
            None => stream.insert(open + 1, argument),
            Some(&(_, end)) => {
                let last = stream
                    .prev_significant(end - 1)
                    .ok_or(TokenError::OutOfRange {
                        index: end,
                        len: stream.len(),
                    })?;
                stream.insert(last + 1, format!(", {}", argument))
            }
        };
    };

    let first = first_code_in(stream, span)?;
    let multi_line = stream.tokens()[span.0..first]
        .iter()
        .any(|t| t.kind == TokenKind::Nl);
    if multi_line {
        let indent = match stream.token(first - 1)? {
            t if t.kind == TokenKind::UnimportantWs => t.text.clone(),
            _ => String::new(),
        };
        stream.insert(first, format!("{},\n{}", argument, indent))
    } else {
        stream.insert(first, format!("{}, ", argument))
    }
}

fn first_code_in(stream: &TokenStream, span: (usize, usize)) -> Result<usize, TokenError> {
    stream
        .next_significant(span.0)
        .filter(|&i| i < span.1)
        .ok_or(TokenError::OutOfRange {
            index: span.0,
            len: stream.len(),
        })
}

// ============================================================================
// Tests
// ============================================================================
