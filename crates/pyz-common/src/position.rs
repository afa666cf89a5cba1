//! Position and location utilities.
//!
//! The scanner and parser work in byte offsets, while diagnostics and debug
//! dumps speak in line/column positions. This module provides the conversion.

use std::fmt;

use memchr::memchr2_iter;
use serde::{Deserialize, Serialize};

/// A half-open byte range `[start, start + length)` in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextRange {
    pub start: u32,
    pub length: u32,
}

impl TextRange {
    pub fn new(start: u32, length: u32) -> Self {
        TextRange { start, length }
    }

    /// Build a range from two offsets. `end` is clamped so the length is never negative.
    pub fn from_bounds(start: u32, end: u32) -> Self {
        TextRange {
            start,
            length: end.saturating_sub(start),
        }
    }

    #[inline]
    pub fn end(&self) -> u32 {
        self.start + self.length
    }

    /// Whether `offset` lies inside the range. The end offset is exclusive.
    #[inline]
    pub fn contains(&self, offset: u32) -> bool {
        offset >= self.start && offset < self.end()
    }

    /// Whether `offset` lies inside the range or exactly at its end.
    #[inline]
    pub fn overlaps_offset(&self, offset: u32) -> bool {
        offset >= self.start && offset <= self.end()
    }

    /// Range containment: `self.start <= other.start && self.end >= other.end`.
    #[inline]
    pub fn contains_range(&self, other: TextRange) -> bool {
        self.start <= other.start && self.end() >= other.end()
    }
}

/// A position in a source file (0-indexed line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// 0-indexed line number
    pub line: u32,
    /// 0-indexed column, in bytes from the start of the line
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Position { line, character }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.line, self.character)
    }
}

/// A range in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Range { start, end }
    }
}

/// Renders as `(line,col)-(line,col)`.
impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Line map for efficient offset -> position conversion.
/// Stores the starting offset of each line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMap {
    /// Starting offset of each line (line_starts[0] is always 0)
    line_starts: Vec<u32>,
}

impl LineMap {
    /// Build a line map from source text.
    ///
    /// `\n`, `\r\n` and a lone `\r` all terminate a line.
    pub fn build(source: &str) -> Self {
        let bytes = source.as_bytes();
        let mut line_starts = vec![0u32];

        for i in memchr2_iter(b'\n', b'\r', bytes) {
            if bytes[i] == b'\r' && bytes.get(i + 1) == Some(&b'\n') {
                // the \n that follows creates the line start
                continue;
            }
            line_starts.push((i + 1) as u32);
        }

        LineMap { line_starts }
    }

    /// Wrap a precomputed, ascending table of line-start offsets.
    ///
    /// An empty table is treated as a single line starting at offset 0.
    pub fn from_line_starts(mut line_starts: Vec<u32>) -> Self {
        if line_starts.first() != Some(&0) {
            line_starts.insert(0, 0);
        }
        debug_assert!(line_starts.windows(2).all(|w| w[0] <= w[1]));
        LineMap { line_starts }
    }

    /// Convert a byte offset to a Position (line, character).
    ///
    /// Binary-searches for the greatest line start `<= offset`; the column is
    /// the distance from that line start. An offset equal to the file length
    /// maps to the end-of-file position.
    pub fn offset_to_position(&self, offset: u32) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert_point) => insert_point.saturating_sub(1),
        };

        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        Position {
            line: line as u32,
            character: offset.saturating_sub(line_start),
        }
    }

    /// Convert a text range to a line/column range.
    pub fn range_of(&self, range: TextRange) -> Range {
        Range {
            start: self.offset_to_position(range.start),
            end: self.offset_to_position(range.end()),
        }
    }

    /// Get the number of lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn line_starts(&self) -> &[u32] {
        &self.line_starts
    }
}

#[cfg(test)]
mod position_tests {
    use super::*;

    #[test]
    fn test_line_map_simple() {
        let source = "line1\nline2\nline3";
        let map = LineMap::build(source);

        assert_eq!(map.line_count(), 3);

        // First character of first line
        assert_eq!(map.offset_to_position(0), Position::new(0, 0));
        // Last character of first line
        assert_eq!(map.offset_to_position(4), Position::new(0, 4));
        // The newline itself still belongs to the first line
        assert_eq!(map.offset_to_position(5), Position::new(0, 5));
        // First character of second line
        assert_eq!(map.offset_to_position(6), Position::new(1, 0));
        // First character of third line
        assert_eq!(map.offset_to_position(12), Position::new(2, 0));
    }

    #[test]
    fn test_line_map_windows_line_endings() {
        let source = "line1\r\nline2\r\nline3";
        let map = LineMap::build(source);

        assert_eq!(map.line_count(), 3);

        // First character of second line (after \r\n)
        assert_eq!(map.offset_to_position(7), Position::new(1, 0));
    }

    #[test]
    fn test_line_map_lone_carriage_return() {
        let map = LineMap::build("a\rb");
        assert_eq!(map.line_starts(), &[0, 2]);
        assert_eq!(map.offset_to_position(2), Position::new(1, 0));
    }

    #[test]
    fn test_text_range_containment() {
        let outer = TextRange::from_bounds(4, 10);
        assert!(outer.contains_range(TextRange::from_bounds(4, 10)));
        assert!(outer.contains_range(TextRange::from_bounds(5, 6)));
        assert!(!outer.contains_range(TextRange::from_bounds(3, 6)));
        assert!(!outer.contains_range(TextRange::from_bounds(9, 11)));
        assert!(outer.contains(9));
        assert!(!outer.contains(10));
        assert!(outer.overlaps_offset(10));
    }

    #[test]
    fn test_range_display() {
        let map = LineMap::build("def f(x):\n    return x\n");
        let range = map.range_of(TextRange::new(21, 1));
        assert_eq!(range.to_string(), "(1,11)-(1,12)");
    }
}
