//! The mutable token stream and its edit primitives.
//!
//! Every primitive works on token indices. Indices are only valid between
//! mutations, which is why scheduled edits are applied from the highest index
//! to the lowest (see [`crate::patch`]).
//!
//! The search primitives are partial: they fail with [`TokenError`] when a
//! scan runs off the stream. Callers only use them where the structural shape
//! they already verified guarantees a match, so a failure is a rule defect,
//! not a user-facing condition.

use std::fmt;

use thiserror::Error;

use crate::text::Position;
use crate::tokenizer::{normalize_dedents, tokenize, tokens_to_source, LexError, Token, TokenKind};

// ============================================================================
// Errors
// ============================================================================

/// Scan direction, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}

/// An edit primitive's structural precondition did not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("no {} token found scanning {direction} from index {start}", describe(.kind, .text))]
    NotFound {
        kind: TokenKind,
        text: Option<String>,
        start: usize,
        direction: Direction,
    },

    #[error("no token at {position} found scanning forward from index {start}")]
    PositionNotFound { position: Position, start: usize },

    #[error("token index {index} out of range for stream of length {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("unbalanced brackets in call opened at index {open}")]
    UnbalancedCall { open: usize },

    #[error("{count} edit(s) scheduled where no token starts, first at {position}")]
    Unanchored { count: usize, position: Position },
}

fn describe(kind: &TokenKind, text: &Option<String>) -> String {
    match text {
        Some(text) => format!("{} {:?}", kind, text),
        None => kind.to_string(),
    }
}

// ============================================================================
// Call Arguments
// ============================================================================

/// Argument spans of a call, as produced by [`TokenStream::parse_call_args`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallArgs {
    /// Half-open `[start, end)` token ranges, one per argument. A range starts
    /// right after the `(` or `,` before it and ends at the `,` or `)` after it.
    pub spans: Vec<(usize, usize)>,
    /// Index just past the closing bracket.
    pub end: usize,
}

// ============================================================================
// Token Stream
// ============================================================================

/// An ordered, mutable sequence of full-fidelity tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Lex `source` and normalize the dedent ordering quirk.
    ///
    /// The normalization runs here, exactly once, before any index is
    /// computed against the stream.
    pub fn from_source(source: &str) -> Result<Self, LexError> {
        let mut tokens = tokenize(source)?;
        normalize_dedents(&mut tokens);
        Ok(TokenStream { tokens })
    }

    /// Wrap an existing token sequence as-is.
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        TokenStream { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// The token at `index`, or [`TokenError::OutOfRange`].
    pub fn token(&self, index: usize) -> Result<&Token, TokenError> {
        self.tokens.get(index).ok_or(TokenError::OutOfRange {
            index,
            len: self.tokens.len(),
        })
    }

    /// Serialize the stream back to source text.
    pub fn to_source(&self) -> String {
        tokens_to_source(&self.tokens)
    }

    // ------------------------------------------------------------------------
    // Searching
    // ------------------------------------------------------------------------

    /// First index `>= start` holding a `kind` token (with `text`, if given).
    pub fn find(&self, start: usize, kind: TokenKind, text: Option<&str>) -> Result<usize, TokenError> {
        (start..self.tokens.len())
            .find(|&i| self.tokens[i].matches(kind, text))
            .ok_or_else(|| TokenError::NotFound {
                kind,
                text: text.map(str::to_string),
                start,
                direction: Direction::Forward,
            })
    }

    /// Last index `<= start` holding a `kind` token (with `text`, if given).
    pub fn reverse_find(
        &self,
        start: usize,
        kind: TokenKind,
        text: Option<&str>,
    ) -> Result<usize, TokenError> {
        let upper = start.min(self.tokens.len().saturating_sub(1));
        (0..=upper)
            .rev()
            .find(|&i| self.tokens.get(i).is_some_and(|t| t.matches(kind, text)))
            .ok_or_else(|| TokenError::NotFound {
                kind,
                text: text.map(str::to_string),
                start,
                direction: Direction::Backward,
            })
    }

    /// Shorthand for `find(start, Op, Some(op))`.
    pub fn find_op(&self, start: usize, op: &str) -> Result<usize, TokenError> {
        self.find(start, TokenKind::Op, Some(op))
    }

    /// Shorthand for `reverse_find(start, Op, Some(op))`.
    pub fn reverse_find_op(&self, start: usize, op: &str) -> Result<usize, TokenError> {
        self.reverse_find(start, TokenKind::Op, Some(op))
    }

    /// First index `>= start` whose token starts at `position`.
    pub fn find_by_position(&self, start: usize, position: Position) -> Result<usize, TokenError> {
        (start..self.tokens.len())
            .find(|&i| {
                let token = &self.tokens[i];
                token.position == Some(position) && !token.text.is_empty()
            })
            .ok_or(TokenError::PositionNotFound { position, start })
    }

    /// Extend `index` forward while the *next* token matches.
    ///
    /// Returns the last index of the matching run (or `index` itself).
    pub fn consume(&self, mut index: usize, kind: TokenKind, text: Option<&str>) -> usize {
        while self
            .tokens
            .get(index + 1)
            .is_some_and(|t| t.matches(kind, text))
        {
            index += 1;
        }
        index
    }

    /// Extend `index` backward while the *previous* token matches.
    ///
    /// Returns the first index of the matching run (or `index` itself).
    pub fn reverse_consume(&self, mut index: usize, kind: TokenKind, text: Option<&str>) -> usize {
        while index > 0 && self.tokens[index - 1].matches(kind, text) {
            index -= 1;
        }
        index
    }

    /// First index `>= start` that is not trivia (whitespace, comment, `Nl`).
    pub fn next_significant(&self, start: usize) -> Option<usize> {
        (start..self.tokens.len()).find(|&i| !self.tokens[i].kind.is_trivia())
    }

    /// Last index `<= start` that is not trivia.
    pub fn prev_significant(&self, start: usize) -> Option<usize> {
        let upper = start.min(self.tokens.len().checked_sub(1)?);
        (0..=upper).rev().find(|&i| !self.tokens[i].kind.is_trivia())
    }

    /// Index of the last token belonging to a node that starts at token
    /// `start` and ends (exclusively) at `end`.
    pub fn find_last_token(&self, start: usize, end: Position) -> Result<usize, TokenError> {
        self.token(start)?;
        let mut last = start;
        for (i, token) in self.tokens.iter().enumerate().skip(start + 1) {
            match token.position {
                Some(position) if position >= end => break,
                _ => last = i,
            }
        }
        Ok(last)
    }

    // ------------------------------------------------------------------------
    // Line Shape
    // ------------------------------------------------------------------------

    /// Is the token range `[start, end]` the only thing on its line?
    ///
    /// True iff only indentation separates `start` from the previous line
    /// break (or the start of the file), and `end` is immediately followed by
    /// a line break.
    pub fn alone_on_line(&self, start: usize, end: usize) -> bool {
        let line_break_or_marker = |i: usize| {
            matches!(
                self.tokens[i].kind,
                TokenKind::Newline | TokenKind::Nl | TokenKind::Indent | TokenKind::Dedent
            )
        };
        let starts_line = match start.checked_sub(1) {
            None => true,
            Some(prev) if line_break_or_marker(prev) => true,
            Some(prev) if self.tokens[prev].kind == TokenKind::UnimportantWs => {
                prev == 0 || line_break_or_marker(prev - 1)
            }
            Some(_) => false,
        };
        starts_line
            && self
                .tokens
                .get(end + 1)
                .is_some_and(|t| t.kind.is_line_break())
    }

    /// Indentation of the line holding token `index`.
    pub fn extract_indent(&self, index: usize) -> &str {
        let mut i = index.min(self.tokens.len());
        while i > 0 && !self.tokens[i - 1].kind.is_line_break() {
            i -= 1;
        }
        let mut indent = "";
        for token in &self.tokens[i..] {
            match token.kind {
                TokenKind::Indent | TokenKind::UnimportantWs => indent = token.text.as_str(),
                TokenKind::Dedent => {}
                _ => break,
            }
        }
        indent
    }

    // ------------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------------

    /// Splice a synthetic token holding `text` in at `index`.
    pub fn insert(&mut self, index: usize, text: impl Into<String>) -> Result<(), TokenError> {
        self.insert_token(index, Token::synthetic(text))
    }

    /// Splice an arbitrary token in at `index` (`index == len` appends).
    pub fn insert_token(&mut self, index: usize, token: Token) -> Result<(), TokenError> {
        if index > self.tokens.len() {
            return Err(TokenError::OutOfRange {
                index,
                len: self.tokens.len(),
            });
        }
        self.tokens.insert(index, token);
        Ok(())
    }

    /// Overwrite the text of the token at `index`, tagging it synthetic.
    ///
    /// The position is kept so later lookups by position still land here.
    pub fn replace(&mut self, index: usize, text: impl Into<String>) -> Result<(), TokenError> {
        let len = self.tokens.len();
        let token = self
            .tokens
            .get_mut(index)
            .ok_or(TokenError::OutOfRange { index, len })?;
        token.kind = TokenKind::Code;
        token.text = text.into();
        Ok(())
    }

    /// Remove the half-open range `[start, end)`.
    pub fn delete_range(&mut self, start: usize, end: usize) -> Result<(), TokenError> {
        let len = self.tokens.len();
        if start > end || end > len {
            return Err(TokenError::OutOfRange {
                index: end.max(start),
                len,
            });
        }
        self.tokens.drain(start..end);
        Ok(())
    }

    /// Replace the half-open range `[start, end)` with one synthetic token.
    pub fn replace_range(
        &mut self,
        start: usize,
        end: usize,
        text: impl Into<String>,
    ) -> Result<(), TokenError> {
        self.delete_range(start, end)?;
        self.insert(start, text)
    }

    // ------------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------------

    /// Partition the argument list opened at `open` into argument spans.
    ///
    /// Only top-level commas split arguments; commas inside nested `()`,
    /// `[]` or `{}` belong to the argument around them. A trailing comma does
    /// not produce an empty argument.
    pub fn parse_call_args(&self, open: usize) -> Result<CallArgs, TokenError> {
        self.token(open)?;
        let mut spans = Vec::new();
        let mut stack = vec![open];
        let mut i = open + 1;
        let mut arg_start = i;

        while let Some(&top) = stack.last() {
            let token = self
                .tokens
                .get(i)
                .ok_or(TokenError::UnbalancedCall { open })?;
            if token.kind == TokenKind::Op {
                match token.text.as_str() {
                    "," if stack.len() == 1 => {
                        spans.push((arg_start, i));
                        arg_start = i + 1;
                    }
                    "(" | "[" | "{" => stack.push(i),
                    ")" | "]" | "}" if closes(&self.tokens[top].text, &token.text) => {
                        stack.pop();
                        if stack.is_empty() && self.has_code(arg_start, i) {
                            spans.push((arg_start, i));
                        }
                    }
                    _ => {}
                }
            }
            i += 1;
        }

        Ok(CallArgs { spans, end: i })
    }

    fn has_code(&self, start: usize, end: usize) -> bool {
        self.tokens[start..end].iter().any(|t| !t.kind.is_trivia())
    }
}

impl fmt::Display for TokenStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tokens
            .iter()
            .try_for_each(|token| f.write_str(&token.text))
    }
}

fn closes(open: &str, close: &str) -> bool {
    matches!((open, close), ("(", ")") | ("[", "]") | ("{", "}"))
}

// ============================================================================
// Tests
// ============================================================================
