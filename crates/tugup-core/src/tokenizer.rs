//! Full-fidelity Python tokenizer.
//!
//! Unlike a compiler tokenizer, nothing is discarded: whitespace runs, comments,
//! escaped newlines and indentation all become tokens, so concatenating the
//! text of every token reproduces the source byte for byte.
//!
//! # Token Shapes
//!
//! | Kind | Text |
//! |------|------|
//! | `Indent` | the indentation whitespace of the first line of a block |
//! | `Dedent` | empty |
//! | `UnimportantWs` | any other run of spaces, tabs or form feeds |
//! | `Newline` | the line ending of a logical line (empty at EOF without one) |
//! | `Nl` | a line ending inside brackets or on a blank/comment-only line |
//! | `EscapedNl` | a backslash continuation including its line ending |
//! | `EndMarker` | empty, always last |
//!
//! # Dedent Ordering
//!
//! The raw token sequence reports the leading whitespace of a dedented line
//! *before* its `Dedent` markers, because dedents are only detected once the
//! first real token of the line is seen. [`normalize_dedents`] moves every
//! `Dedent` in front of that whitespace; the edit primitives rely on the
//! normalized order.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::text::{LineIndex, Position};

// ============================================================================
// Token Types
// ============================================================================

/// Kind tag for a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Name,
    Number,
    String,
    Op,
    Comment,
    Newline,
    Nl,
    Indent,
    Dedent,
    UnimportantWs,
    EscapedNl,
    EndMarker,
    /// Synthetic text produced by an edit.
    Code,
}

impl TokenKind {
    /// Tokens that never affect the meaning of the code around them.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::UnimportantWs | TokenKind::Comment | TokenKind::Nl | TokenKind::EscapedNl
        )
    }

    /// Tokens that end a physical line.
    pub fn is_line_break(self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Nl)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single token with its literal source text.
///
/// `position` is `None` for synthetic tokens inserted by edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: Option<Position>,
}

impl Token {
    /// Create a token lexed from the source at `position`.
    pub fn new(kind: TokenKind, text: impl Into<String>, position: Position) -> Self {
        Token {
            kind,
            text: text.into(),
            position: Some(position),
        }
    }

    /// Create a synthetic token with no source position.
    pub fn synthetic(text: impl Into<String>) -> Self {
        Token {
            kind: TokenKind::Code,
            text: text.into(),
            position: None,
        }
    }

    /// Does this token have the given kind and, when given, the given text?
    pub fn matches(&self, kind: TokenKind, text: Option<&str>) -> bool {
        self.kind == kind && text.is_none_or(|text| self.text == text)
    }

    /// Is this the operator `op`?
    pub fn is_op(&self, op: &str) -> bool {
        self.matches(TokenKind::Op, Some(op))
    }

    /// Is this the name `name`?
    pub fn is_name(&self, name: &str) -> bool {
        self.matches(TokenKind::Name, Some(name))
    }
}

// ============================================================================
// Errors
// ============================================================================

/// The source is not lexically well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated string literal at {position}")]
    UnterminatedString { position: Position },

    #[error("unterminated triple-quoted string literal at {position}")]
    UnterminatedTripleQuotedString { position: Position },

    #[error("unindent does not match any outer indentation level at {position}")]
    InconsistentDedent { position: Position },

    #[error("unmatched '{bracket}' at {position}")]
    UnmatchedBracket { bracket: char, position: Position },

    #[error("unexpected EOF in multi-line statement opened at {position}")]
    UnexpectedEof { position: Position },

    #[error("invalid character {ch:?} at {position}")]
    InvalidCharacter { ch: char, position: Position },
}

// ============================================================================
// Entry Points
// ============================================================================

/// Tokenize `source` into its raw full-fidelity token sequence.
///
/// The result still carries the dedent ordering quirk; see
/// [`normalize_dedents`].
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).run()
}

/// Swap every `UnimportantWs, Dedent` pair so dedent markers come first.
///
/// A single linear pass; a run of several dedents bubbles the whitespace past
/// all of them.
pub fn normalize_dedents(tokens: &mut [Token]) {
    for i in 0..tokens.len().saturating_sub(1) {
        if tokens[i].kind == TokenKind::UnimportantWs && tokens[i + 1].kind == TokenKind::Dedent {
            tokens.swap(i, i + 1);
        }
    }
}

/// Concatenate token texts back into source text.
pub fn tokens_to_source(tokens: &[Token]) -> String {
    tokens.iter().map(|token| token.text.as_str()).collect()
}

// ============================================================================
// Lexer
// ============================================================================

const THREE_CHAR_OPS: [&str; 5] = ["**=", "//=", ">>=", "<<=", "..."];

const TWO_CHAR_OPS: [&str; 19] = [
    "**", "//", "<<", ">>", "<=", ">=", "==", "!=", "->", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "@=", ":=",
];

const ONE_CHAR_OPS: &str = "+-*/%@&|^~<>()[]{},:;.=!";

const STRING_PREFIXES: [&str; 11] = ["r", "u", "b", "f", "t", "br", "rb", "fr", "rf", "tr", "rt"];

struct Lexer<'s> {
    src: &'s str,
    bytes: &'s [u8],
    pos: usize,
    lines: LineIndex,
    tokens: Vec<Token>,
    indents: Vec<usize>,
    brackets: Vec<(char, Position)>,
    at_line_start: bool,
    line_has_content: bool,
}

impl<'s> Lexer<'s> {
    fn new(src: &'s str) -> Self {
        Lexer {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            lines: LineIndex::new(src),
            tokens: Vec::new(),
            indents: vec![0],
            brackets: Vec::new(),
            at_line_start: true,
            line_has_content: false,
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        while self.pos < self.bytes.len() {
            if self.at_line_start && self.brackets.is_empty() {
                self.at_line_start = false;
                self.line_start()?;
            } else {
                self.next_token()?;
            }
        }
        self.finish()
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        let position = self.lines.position(start);
        self.tokens
            .push(Token::new(kind, &self.src[start..end], position));
        self.pos = end;
    }

    fn scan_while(&self, mut i: usize, pred: impl Fn(u8) -> bool) -> usize {
        while i < self.bytes.len() && pred(self.bytes[i]) {
            i += 1;
        }
        i
    }

    fn current_indent(&self) -> usize {
        self.indents.last().copied().unwrap_or(0)
    }

    /// Handle leading whitespace of a physical line outside brackets.
    fn line_start(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        let end = self.scan_while(start, |b| matches!(b, b' ' | b'\t' | b'\x0c'));
        let blank = matches!(self.bytes.get(end), None | Some(b'\n' | b'\r' | b'#'));

        if blank {
            if end > start {
                self.push(TokenKind::UnimportantWs, start, end);
            }
            return Ok(());
        }

        let width = indent_width(&self.src[start..end]);
        let current = self.current_indent();
        if width > current {
            self.indents.push(width);
            self.push(TokenKind::Indent, start, end);
            return Ok(());
        }

        if end > start {
            self.push(TokenKind::UnimportantWs, start, end);
        }
        if width < current {
            let position = self.lines.position(end);
            while self.current_indent() > width {
                self.indents.pop();
                self.tokens.push(Token::new(TokenKind::Dedent, "", position));
            }
            if self.current_indent() != width {
                return Err(LexError::InconsistentDedent { position });
            }
        }
        Ok(())
    }

    fn next_token(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        let Some(ch) = self.src[start..].chars().next() else {
            return Ok(());
        };

        match ch {
            ' ' | '\t' | '\x0c' => {
                let end = self.scan_while(start, |b| matches!(b, b' ' | b'\t' | b'\x0c'));
                self.push(TokenKind::UnimportantWs, start, end);
            }
            '\n' => self.line_break(start, start + 1),
            '\r' => {
                let end = if self.bytes.get(start + 1) == Some(&b'\n') {
                    start + 2
                } else {
                    start + 1
                };
                self.line_break(start, end);
            }
            '#' => {
                let end = self.scan_while(start, |b| b != b'\n' && b != b'\r');
                self.push(TokenKind::Comment, start, end);
            }
            '\\' => {
                let end = match (self.bytes.get(start + 1), self.bytes.get(start + 2)) {
                    (Some(b'\r'), Some(b'\n')) => start + 3,
                    (Some(b'\n' | b'\r'), _) => start + 2,
                    _ => {
                        return Err(LexError::InvalidCharacter {
                            ch,
                            position: self.lines.position(start),
                        })
                    }
                };
                self.push(TokenKind::EscapedNl, start, end);
            }
            '"' | '\'' => self.string(start, start)?,
            '0'..='9' => self.number(start),
            '.' if self.bytes.get(start + 1).is_some_and(u8::is_ascii_digit) => self.number(start),
            c if c == '_' || c.is_alphabetic() => {
                let mut end = start;
                for (offset, c) in self.src[start..].char_indices() {
                    if c == '_' || c.is_alphanumeric() {
                        end = start + offset + c.len_utf8();
                    } else {
                        break;
                    }
                }
                let word = &self.src[start..end];
                let quote_follows = matches!(self.bytes.get(end), Some(b'"' | b'\''));
                if quote_follows && is_string_prefix(word) {
                    self.string(start, end)?;
                } else {
                    self.line_has_content = true;
                    self.push(TokenKind::Name, start, end);
                }
            }
            _ => self.operator(start, ch)?,
        }
        Ok(())
    }

    fn line_break(&mut self, start: usize, end: usize) {
        let kind = if self.brackets.is_empty() && self.line_has_content {
            TokenKind::Newline
        } else {
            TokenKind::Nl
        };
        self.push(kind, start, end);
        if self.brackets.is_empty() {
            self.at_line_start = true;
            self.line_has_content = false;
        }
    }

    /// Lex a string literal whose prefix starts at `start` and whose opening
    /// quote sits at `quote_at`.
    fn string(&mut self, start: usize, quote_at: usize) -> Result<(), LexError> {
        let position = self.lines.position(start);
        let quote = self.bytes[quote_at];
        let triple = self.bytes[quote_at..].starts_with(&[quote; 3]);
        let mut i = quote_at + if triple { 3 } else { 1 };

        loop {
            match self.bytes.get(i) {
                None => {
                    return Err(if triple {
                        LexError::UnterminatedTripleQuotedString { position }
                    } else {
                        LexError::UnterminatedString { position }
                    })
                }
                Some(b'\\') => {
                    i += if self.bytes[i + 1..].starts_with(b"\r\n") {
                        3
                    } else {
                        2
                    };
                }
                Some(&b) if b == quote => {
                    if !triple {
                        i += 1;
                        break;
                    }
                    if self.bytes[i..].starts_with(&[quote; 3]) {
                        i += 3;
                        break;
                    }
                    i += 1;
                }
                Some(b'\n' | b'\r') if !triple => {
                    return Err(LexError::UnterminatedString { position });
                }
                Some(_) => i += 1,
            }
        }

        self.line_has_content = true;
        self.push(TokenKind::String, start, i);
        Ok(())
    }

    fn number(&mut self, start: usize) {
        let b = self.bytes;
        let digits = |c: u8| c.is_ascii_digit() || c == b'_';
        let radix_prefix = b[start] == b'0'
            && matches!(b.get(start + 1), Some(b'x' | b'X' | b'o' | b'O' | b'b' | b'B'));

        let mut i;
        if radix_prefix {
            i = self.scan_while(start + 2, |c| c.is_ascii_hexdigit() || c == b'_');
        } else {
            i = self.scan_while(start, digits);
            if b.get(i) == Some(&b'.') {
                i = self.scan_while(i + 1, digits);
            }
            if matches!(b.get(i), Some(b'e' | b'E')) {
                let mut j = i + 1;
                if matches!(b.get(j), Some(b'+' | b'-')) {
                    j += 1;
                }
                if b.get(j).is_some_and(u8::is_ascii_digit) {
                    i = self.scan_while(j, digits);
                }
            }
        }
        if matches!(b.get(i), Some(b'j' | b'J' | b'l' | b'L')) {
            i += 1;
        }

        self.line_has_content = true;
        self.push(TokenKind::Number, start, i);
    }

    fn operator(&mut self, start: usize, ch: char) -> Result<(), LexError> {
        let rest = &self.src[start..];
        let position = self.lines.position(start);

        let len = if THREE_CHAR_OPS.iter().any(|op| rest.starts_with(op)) {
            3
        } else if TWO_CHAR_OPS.iter().any(|op| rest.starts_with(op)) {
            2
        } else if ONE_CHAR_OPS.contains(ch) {
            1
        } else {
            return Err(LexError::InvalidCharacter { ch, position });
        };

        match ch {
            '(' | '[' | '{' => self.brackets.push((ch, position)),
            ')' | ']' | '}' => match self.brackets.pop() {
                Some((open, _)) if closing_bracket(open) == ch => {}
                _ => return Err(LexError::UnmatchedBracket { bracket: ch, position }),
            },
            _ => {}
        }

        self.line_has_content = true;
        self.push(TokenKind::Op, start, start + len);
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<Token>, LexError> {
        if let Some(&(_, position)) = self.brackets.last() {
            return Err(LexError::UnexpectedEof { position });
        }

        let end = self.lines.position(self.bytes.len());
        if self.line_has_content {
            self.tokens.push(Token::new(TokenKind::Newline, "", end));
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.tokens.push(Token::new(TokenKind::Dedent, "", end));
        }
        self.tokens.push(Token::new(TokenKind::EndMarker, "", end));
        Ok(self.tokens)
    }
}

fn closing_bracket(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

fn is_string_prefix(word: &str) -> bool {
    word.len() <= 2
        && STRING_PREFIXES
            .iter()
            .any(|prefix| prefix.eq_ignore_ascii_case(word))
}

/// Column width of indentation, with tabs advancing to the next multiple of 8.
fn indent_width(ws: &str) -> usize {
    ws.bytes().fold(0, |width, b| match b {
        b'\t' => (width / 8 + 1) * 8,
        b'\x0c' => 0,
        _ => width + 1,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_text(source: &str) -> Vec<(TokenKind, String)> {
        let mut tokens = tokenize(source).expect("tokenize error");
        normalize_dedents(&mut tokens);
        tokens.into_iter().map(|t| (t.kind, t.text)).collect()
    }

    fn tok(kind: TokenKind, text: &str) -> (TokenKind, String) {
        (kind, text.to_string())
    }

    mod shapes {
        use super::*;
        use TokenKind::*;

        #[test]
        fn simple_assignment_with_comment() {
            assert_eq!(
                kinds_and_text("x = 1  # note\n"),
                vec![
                    tok(Name, "x"),
                    tok(UnimportantWs, " "),
                    tok(Op, "="),
                    tok(UnimportantWs, " "),
                    tok(Number, "1"),
                    tok(UnimportantWs, "  "),
                    tok(Comment, "# note"),
                    tok(Newline, "\n"),
                    tok(EndMarker, ""),
                ]
            );
        }

        #[test]
        fn missing_trailing_newline_gets_empty_newline() {
            assert_eq!(
                kinds_and_text("a"),
                vec![tok(Name, "a"), tok(Newline, ""), tok(EndMarker, "")]
            );
        }

        #[test]
        fn blank_and_comment_lines_are_nl() {
            assert_eq!(
                kinds_and_text("\n  \n# c\n"),
                vec![
                    tok(Nl, "\n"),
                    tok(UnimportantWs, "  "),
                    tok(Nl, "\n"),
                    tok(Comment, "# c"),
                    tok(Nl, "\n"),
                    tok(EndMarker, ""),
                ]
            );
        }

        #[test]
        fn newlines_inside_brackets_are_nl() {
            let tokens = kinds_and_text("f(\n    1,\n)\n");
            assert_eq!(
                tokens,
                vec![
                    tok(Name, "f"),
                    tok(Op, "("),
                    tok(Nl, "\n"),
                    tok(UnimportantWs, "    "),
                    tok(Number, "1"),
                    tok(Op, ","),
                    tok(Nl, "\n"),
                    tok(Op, ")"),
                    tok(Newline, "\n"),
                    tok(EndMarker, ""),
                ]
            );
        }

        #[test]
        fn indent_carries_whitespace_and_dedent_is_empty() {
            assert_eq!(
                kinds_and_text("if x:\n    y\nz\n"),
                vec![
                    tok(Name, "if"),
                    tok(UnimportantWs, " "),
                    tok(Name, "x"),
                    tok(Op, ":"),
                    tok(Newline, "\n"),
                    tok(Indent, "    "),
                    tok(Name, "y"),
                    tok(Newline, "\n"),
                    tok(Dedent, ""),
                    tok(Name, "z"),
                    tok(Newline, "\n"),
                    tok(EndMarker, ""),
                ]
            );
        }

        #[test]
        fn string_prefixes_and_triple_quotes() {
            assert_eq!(
                kinds_and_text("rb'x' f\"{a}\" '''a\nb'''\n"),
                vec![
                    tok(String, "rb'x'"),
                    tok(UnimportantWs, " "),
                    tok(String, "f\"{a}\""),
                    tok(UnimportantWs, " "),
                    tok(String, "'''a\nb'''"),
                    tok(Newline, "\n"),
                    tok(EndMarker, ""),
                ]
            );
        }

        #[test]
        fn escaped_quotes_and_continuations() {
            assert_eq!(
                kinds_and_text("s = 'it\\'s' \\\n  + t\n"),
                vec![
                    tok(Name, "s"),
                    tok(UnimportantWs, " "),
                    tok(Op, "="),
                    tok(UnimportantWs, " "),
                    tok(String, "'it\\'s'"),
                    tok(UnimportantWs, " "),
                    tok(EscapedNl, "\\\n"),
                    tok(UnimportantWs, "  "),
                    tok(Op, "+"),
                    tok(UnimportantWs, " "),
                    tok(Name, "t"),
                    tok(Newline, "\n"),
                    tok(EndMarker, ""),
                ]
            );
        }

        #[test]
        fn numbers_and_operators() {
            assert_eq!(
                kinds_and_text("a **= 0x_FF + 1_000.5e-3j\n"),
                vec![
                    tok(Name, "a"),
                    tok(UnimportantWs, " "),
                    tok(Op, "**="),
                    tok(UnimportantWs, " "),
                    tok(Number, "0x_FF"),
                    tok(UnimportantWs, " "),
                    tok(Op, "+"),
                    tok(UnimportantWs, " "),
                    tok(Number, "1_000.5e-3j"),
                    tok(Newline, "\n"),
                    tok(EndMarker, ""),
                ]
            );
        }

        #[test]
        fn name_that_looks_like_a_prefix() {
            assert_eq!(
                kinds_and_text("rb + br\n")[0],
                tok(Name, "rb"),
            );
        }
    }

    mod dedent_quirk {
        use super::*;

        #[test]
        fn raw_order_has_whitespace_before_dedent() {
            let source = "if a:\n    if b:\n        c\n    d\n";
            let raw: Vec<TokenKind> = tokenize(source)
                .expect("tokenize error")
                .into_iter()
                .map(|t| t.kind)
                .collect();
            let dedent = raw
                .iter()
                .position(|&k| k == TokenKind::Dedent)
                .expect("dedent");
            assert_eq!(raw[dedent - 1], TokenKind::UnimportantWs);
        }

        #[test]
        fn normalized_order_has_dedent_first() {
            let tokens = kinds_and_text("if a:\n    if b:\n        c\n    d\n");
            let dedent = tokens
                .iter()
                .position(|(k, _)| *k == TokenKind::Dedent)
                .expect("dedent");
            assert_eq!(tokens[dedent - 1].0, TokenKind::Newline);
            assert_eq!(tokens[dedent + 1], tok(TokenKind::UnimportantWs, "    "));
            assert_eq!(tokens[dedent + 2], tok(TokenKind::Name, "d"));
        }

        #[test]
        fn whitespace_bubbles_past_several_dedents() {
            let source = "if a:\n  if b:\n    if c:\n      d\n  e\n";
            let tokens = kinds_and_text(source);
            let e = tokens
                .iter()
                .position(|(_, text)| text == "e")
                .expect("e");
            assert_eq!(tokens[e - 1], tok(TokenKind::UnimportantWs, "  "));
            assert_eq!(tokens[e - 2].0, TokenKind::Dedent);
            assert_eq!(tokens[e - 3].0, TokenKind::Dedent);
            assert_eq!(tokens[e - 4].0, TokenKind::Newline);
        }
    }

    mod positions {
        use super::*;

        #[test]
        fn tokens_carry_line_and_byte_column() {
            let tokens = tokenize("a = 'é'\nb\n").expect("tokenize error");
            let b = tokens.iter().find(|t| t.text == "b").expect("b");
            assert_eq!(b.position, Some(Position::new(2, 0)));
            let s = tokens
                .iter()
                .find(|t| t.kind == TokenKind::String)
                .expect("string");
            assert_eq!(s.position, Some(Position::new(1, 4)));
        }

        #[test]
        fn dedent_sits_at_first_token_of_line() {
            let tokens = tokenize("if a:\n    b\nc\n").expect("tokenize error");
            let dedent = tokens
                .iter()
                .find(|t| t.kind == TokenKind::Dedent)
                .expect("dedent");
            assert_eq!(dedent.position, Some(Position::new(3, 0)));
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn unterminated_string() {
            assert!(matches!(
                tokenize("x = 'abc\n"),
                Err(LexError::UnterminatedString { .. })
            ));
        }

        #[test]
        fn unterminated_triple_quoted_string() {
            assert!(matches!(
                tokenize("x = \"\"\"abc\n"),
                Err(LexError::UnterminatedTripleQuotedString { .. })
            ));
        }

        #[test]
        fn inconsistent_dedent() {
            assert!(matches!(
                tokenize("if a:\n    b\n  c\n"),
                Err(LexError::InconsistentDedent { .. })
            ));
        }

        #[test]
        fn unmatched_brackets() {
            assert!(matches!(
                tokenize("f(]\n"),
                Err(LexError::UnmatchedBracket { bracket: ']', .. })
            ));
            assert!(matches!(
                tokenize("f(\n"),
                Err(LexError::UnexpectedEof { .. })
            ));
        }

        #[test]
        fn invalid_character() {
            assert!(matches!(
                tokenize("a $ b\n"),
                Err(LexError::InvalidCharacter { ch: '$', .. })
            ));
        }
    }

    mod roundtrip {
        use super::*;

        const SOURCES: &[&str] = &[
            "",
            "\n",
            "x = 1  # note\n",
            "a",
            "def f(a, *, b=1):\n\treturn a\r\n",
            "class A:\n    def f(self):\n        pass\n\n\n    x = 1\n",
            "s = '''\nmulti\n'''  \n",
            "x = [\n    1,  # one\n    2,\n]\n",
            "if a:\n    pass\n   \n",
            "y = a \\\n    + b\n",
            "z = f'{a!r}' b\"\\\"\"\n",
            "é = 'ü'\n",
        ];

        #[test]
        fn concatenated_text_reproduces_source() {
            for source in SOURCES {
                let mut tokens = tokenize(source).expect("tokenize error");
                assert_eq!(&tokens_to_source(&tokens), source);
                normalize_dedents(&mut tokens);
                assert_eq!(&tokens_to_source(&tokens), source);
            }
        }
    }
}
