//! Source location tracking

use serde::{Deserialize, Serialize};

/// A span representing a range in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of the start
    pub start: usize,
    /// Byte offset of the end (exclusive)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    /// Merge two spans into one that covers both
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::dummy()
    }
}

/// A human-facing location: 1-based line and column plus the byte offset.
///
/// Columns count characters, not bytes, so multi-byte identifiers do not
/// skew diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Maps byte offsets of one source text to line/column positions.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a str,
    /// Byte offset at which each line starts
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            source,
            line_starts,
        }
    }

    /// Resolve a byte offset. Offsets past the end clamp to the end of input.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.source.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let column = self
            .source
            .get(line_start..offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(offset - line_start);
        Position::new(line + 1, column + 1, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge() {
        let a = Span::new(4, 10);
        let b = Span::new(2, 6);
        assert_eq!(a.merge(b), Span::new(2, 10));
    }

    #[test]
    fn test_line_index_positions() {
        let index = LineIndex::new("SELECT a\nFROM t\n");
        assert_eq!(index.position(0), Position::new(1, 1, 0));
        assert_eq!(index.position(7), Position::new(1, 8, 7));
        assert_eq!(index.position(9), Position::new(2, 1, 9));
        assert_eq!(index.position(14), Position::new(2, 6, 14));
    }

    #[test]
    fn test_line_index_counts_chars() {
        let index = LineIndex::new("SELECT 'é', x");
        // 'é' is two bytes; x sits at byte 13 but column 13
        assert_eq!(index.position(13), Position::new(1, 13, 13));
    }

    #[test]
    fn test_line_index_clamps() {
        let index = LineIndex::new("ab");
        assert_eq!(index.position(99), Position::new(1, 3, 2));
    }
}
