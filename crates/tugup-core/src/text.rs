//! Source positions and byte offset conversions.
//!
//! A [`Position`] is the join key between the structural pass (tree nodes) and
//! the token pass (concrete tokens). Both sides derive their positions from
//! byte offsets through a [`LineIndex`] built over the same text, so a node and
//! its first token always agree on where they start.
//!
//! ## Coordinate Conventions
//!
//! - Lines are **1-indexed**
//! - Columns are **0-indexed UTF-8 byte offsets** within the line
//! - Lines are delimited by `\n` only (`\r\n` ends with `\n`; a lone `\r` does
//!   not start a new line)

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Position
// ============================================================================

/// An immutable `(line, column)` coordinate.
///
/// Ordering is lexicographic: first by line, then by column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    /// 1-indexed line number.
    pub line: u32,
    /// 0-indexed byte column within the line.
    pub column: u32,
}

impl Position {
    /// Create a new position.
    pub const fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// ============================================================================
// Line Index
// ============================================================================

/// Precomputed line starts for O(log n) offset to position conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    /// Build the index for `text`.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        LineIndex {
            line_starts,
            len: text.len(),
        }
    }

    /// Convert a byte offset to a position.
    ///
    /// Offsets beyond the end of the text are clamped to the end.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let column = offset - self.line_starts[line];
        Position::new(line as u32 + 1, column as u32)
    }

    /// Convert a position back to a byte offset.
    ///
    /// Returns `None` if the line does not exist or the column runs past the
    /// end of the text.
    pub fn offset(&self, position: Position) -> Option<usize> {
        let line = (position.line as usize).checked_sub(1)?;
        let start = *self.line_starts.get(line)?;
        let offset = start + position.column as usize;
        (offset <= self.len).then_some(offset)
    }

    /// Number of lines (a trailing newline opens a final empty line).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_to_position_simple() {
        let index = LineIndex::new("line1\nline2\nline3\n");
        assert_eq!(index.position(0), Position::new(1, 0));
        assert_eq!(index.position(4), Position::new(1, 4));
        assert_eq!(index.position(5), Position::new(1, 5)); // newline char
        assert_eq!(index.position(6), Position::new(2, 0));
        assert_eq!(index.position(12), Position::new(3, 0));
        assert_eq!(index.line_count(), 4);
    }

    #[test]
    fn columns_count_bytes() {
        let index = LineIndex::new("x = 'é'\ny\n");
        // 'é' is two bytes, so the closing quote sits at byte column 7
        assert_eq!(index.position(7), Position::new(1, 7));
        assert_eq!(index.position(9), Position::new(2, 0));
    }

    #[test]
    fn roundtrip_offsets() {
        let text = "def foo():\n    pass\n";
        let index = LineIndex::new(text);
        for offset in 0..=text.len() {
            let position = index.position(offset);
            assert_eq!(
                index.offset(position),
                Some(offset),
                "roundtrip failed for offset {} via {}",
                offset,
                position
            );
        }
    }

    #[test]
    fn carriage_return_does_not_start_a_line() {
        let index = LineIndex::new("a\rb\r\nc");
        assert_eq!(index.position(2), Position::new(1, 2));
        assert_eq!(index.position(5), Position::new(2, 0));
    }

    #[test]
    fn offset_beyond_content_is_clamped() {
        let index = LineIndex::new("short");
        assert_eq!(index.position(100), Position::new(1, 5));
        assert_eq!(index.offset(Position::new(9, 0)), None);
        assert_eq!(index.offset(Position::new(0, 0)), None);
    }

    #[test]
    fn positions_order_by_line_then_column() {
        assert!(Position::new(1, 9) < Position::new(2, 0));
        assert!(Position::new(2, 3) < Position::new(2, 4));
        assert_eq!(Position::new(3, 1).to_string(), "3:1");
    }
}
