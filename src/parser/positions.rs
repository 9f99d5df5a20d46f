//! Source positions.
//!
//! tree-sitter reports rows and byte columns; diagnostics want the same thing
//! plus the byte offset, so the conversion lives here.

use serde::Serialize;

/// A position in source code (0-indexed line and byte column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    pub line: usize,
    pub col: usize,
    pub byte: usize,
}

/// Half-open range between two positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn of(node: &tree_sitter::Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start: Position { line: start.row, col: start.column, byte: node.start_byte() },
            end: Position { line: end.row, col: end.column, byte: node.end_byte() },
        }
    }
}

/// Convert a byte offset to a line/column position.
pub fn position_at(source: &str, byte_offset: usize) -> Position {
    let byte_offset = byte_offset.min(source.len());
    let before = &source.as_bytes()[..byte_offset];
    let line = before.iter().filter(|&&b| b == b'\n').count();
    let line_start = before.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
    Position { line, col: byte_offset - line_start, byte: byte_offset }
}
