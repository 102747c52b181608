//! Structural tree: a read-only facade over the tree-sitter Python grammar.
//!
//! The rest of the engine never touches `tree_sitter` types directly. Nodes
//! are exposed as [`SyntaxNode`], whose [`NodeKind`] is a closed sum type so
//! handler dispatch is a table lookup on a tag. Positions are derived from
//! byte offsets through the same [`LineIndex`] the tokenizer uses, so a node
//! and its first token always report the same [`Position`].

use std::fmt;

use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};
use tugup_core::text::{LineIndex, Position};

// ============================================================================
// Errors
// ============================================================================

/// The source could not be parsed into a complete tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("invalid syntax at {position}")]
    Invalid { position: Position },

    #[error("failed to load the Python grammar: {message}")]
    Language { message: String },

    #[error("parser produced no tree")]
    NoTree,
}

// ============================================================================
// Node Kinds
// ============================================================================

/// Grammar node kinds the engine and its rules dispatch on.
///
/// Everything else maps to [`NodeKind::Other`]; use
/// [`SyntaxNode::grammar_kind`] for the raw grammar name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Module,
    Block,
    ExpressionStatement,
    Assignment,
    AugmentedAssignment,
    Delete,
    Import,
    ImportFrom,
    DottedName,
    AliasedImport,
    RelativeImport,
    WildcardImport,
    FunctionDefinition,
    ClassDefinition,
    Decorator,
    Parameters,
    LambdaParameters,
    DefaultParameter,
    TypedParameter,
    TypedDefaultParameter,
    Call,
    ArgumentList,
    KeywordArgument,
    ListSplat,
    DictionarySplat,
    Attribute,
    Subscript,
    Identifier,
    String,
    Interpolation,
    ForStatement,
    ForInClause,
    AsPatternTarget,
    PatternList,
    TuplePattern,
    ListPattern,
    ListSplatPattern,
    ExpressionList,
    ParenthesizedExpression,
    Tuple,
    List,
    Other,
}

impl NodeKind {
    /// Map a tree-sitter-python node kind to its tag.
    pub fn from_grammar(kind: &str) -> Self {
        match kind {
            "module" => NodeKind::Module,
            "block" => NodeKind::Block,
            "expression_statement" => NodeKind::ExpressionStatement,
            "assignment" => NodeKind::Assignment,
            "augmented_assignment" => NodeKind::AugmentedAssignment,
            "delete_statement" => NodeKind::Delete,
            "import_statement" => NodeKind::Import,
            "import_from_statement" => NodeKind::ImportFrom,
            "dotted_name" => NodeKind::DottedName,
            "aliased_import" => NodeKind::AliasedImport,
            "relative_import" => NodeKind::RelativeImport,
            "wildcard_import" => NodeKind::WildcardImport,
            "function_definition" => NodeKind::FunctionDefinition,
            "class_definition" => NodeKind::ClassDefinition,
            "decorator" => NodeKind::Decorator,
            "parameters" => NodeKind::Parameters,
            "lambda_parameters" => NodeKind::LambdaParameters,
            "default_parameter" => NodeKind::DefaultParameter,
            "typed_parameter" => NodeKind::TypedParameter,
            "typed_default_parameter" => NodeKind::TypedDefaultParameter,
            "call" => NodeKind::Call,
            "argument_list" => NodeKind::ArgumentList,
            "keyword_argument" => NodeKind::KeywordArgument,
            "list_splat" => NodeKind::ListSplat,
            "dictionary_splat" => NodeKind::DictionarySplat,
            "attribute" => NodeKind::Attribute,
            "subscript" => NodeKind::Subscript,
            "identifier" => NodeKind::Identifier,
            "string" => NodeKind::String,
            "interpolation" => NodeKind::Interpolation,
            "for_statement" => NodeKind::ForStatement,
            "for_in_clause" => NodeKind::ForInClause,
            "as_pattern_target" => NodeKind::AsPatternTarget,
            "pattern_list" => NodeKind::PatternList,
            "tuple_pattern" => NodeKind::TuplePattern,
            "list_pattern" => NodeKind::ListPattern,
            "list_splat_pattern" => NodeKind::ListSplatPattern,
            "expression_list" => NodeKind::ExpressionList,
            "parenthesized_expression" => NodeKind::ParenthesizedExpression,
            "tuple" => NodeKind::Tuple,
            "list" => NodeKind::List,
            _ => NodeKind::Other,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ============================================================================
// Syntax Tree
// ============================================================================

/// A parsed source file. Owns the text its nodes borrow from.
pub struct SyntaxTree {
    source: String,
    lines: LineIndex,
    tree: Tree,
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("len", &self.source.len())
            .field("lines", &self.lines.line_count())
            .finish_non_exhaustive()
    }
}

/// Parse `source` with the tree-sitter Python grammar.
///
/// A tree containing any error or missing node is rejected.
pub fn parse(source: &str) -> Result<SyntaxTree, SyntaxError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| SyntaxError::Language {
            message: e.to_string(),
        })?;
    let tree = parser.parse(source, None).ok_or(SyntaxError::NoTree)?;
    let lines = LineIndex::new(source);

    let root = tree.root_node();
    if root.has_error() {
        let offset = first_error(root).map_or(0, |node| node.start_byte());
        return Err(SyntaxError::Invalid {
            position: lines.position(offset),
        });
    }

    Ok(SyntaxTree {
        source: source.to_string(),
        lines,
        tree,
    })
}

fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    None
}

impl SyntaxTree {
    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode {
            node: self.tree.root_node(),
            tree: self,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.lines
    }
}

// ============================================================================
// Syntax Node
// ============================================================================

/// A node of a [`SyntaxTree`].
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    node: Node<'t>,
    tree: &'t SyntaxTree,
}

impl<'t> SyntaxNode<'t> {
    fn wrap(&self, node: Node<'t>) -> SyntaxNode<'t> {
        SyntaxNode {
            node,
            tree: self.tree,
        }
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::from_grammar(self.node.kind())
    }

    /// The raw grammar kind name, e.g. `"import_from_statement"`.
    pub fn grammar_kind(&self) -> &'static str {
        self.node.kind()
    }

    pub fn is(&self, kind: NodeKind) -> bool {
        self.kind() == kind
    }

    /// Start position; the join key with the token stream.
    pub fn position(&self) -> Position {
        self.tree.lines.position(self.node.start_byte())
    }

    /// Exclusive end position.
    pub fn end_position(&self) -> Position {
        self.tree.lines.position(self.node.end_byte())
    }

    /// The node's source text.
    pub fn text(&self) -> &'t str {
        &self.tree.source[self.node.byte_range()]
    }

    /// Named children in source order, without comments.
    pub fn children(&self) -> Vec<SyntaxNode<'t>> {
        let mut cursor = self.node.walk();
        let nodes: Vec<Node<'t>> = self.node.named_children(&mut cursor).collect();
        nodes
            .into_iter()
            .filter(|child| !child.is_extra())
            .map(|child| self.wrap(child))
            .collect()
    }

    pub fn child_by_field(&self, field: &str) -> Option<SyntaxNode<'t>> {
        self.node
            .child_by_field_name(field)
            .map(|child| self.wrap(child))
    }

    /// All children stored under `field`, in source order.
    pub fn children_by_field(&self, field: &str) -> Vec<SyntaxNode<'t>> {
        let mut cursor = self.node.walk();
        let nodes: Vec<Node<'t>> = self
            .node
            .children_by_field_name(field, &mut cursor)
            .collect();
        nodes.into_iter().map(|child| self.wrap(child)).collect()
    }

    pub fn parent(&self) -> Option<SyntaxNode<'t>> {
        self.node.parent().map(|parent| self.wrap(parent))
    }

    /// Parent, grandparent and so on up to the module.
    pub fn ancestors(&self) -> impl Iterator<Item = SyntaxNode<'t>> {
        std::iter::successors(self.parent(), |node| node.parent())
    }

    /// Is this node the child stored under `field` of `parent`?
    pub fn is_field_of(&self, parent: SyntaxNode<'t>, field: &str) -> bool {
        parent.child_by_field(field) == Some(*self)
    }
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Eq for SyntaxNode<'_> {}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}..{}",
            self.grammar_kind(),
            self.position(),
            self.end_position()
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
