//! Byte offset ↔ LSP position conversion.
//!
//! Parsers in this workspace report byte offsets; the protocol speaks in
//! line / UTF-16 column pairs. [`LineIndex`] bridges the two.

use tower_lsp_server::ls_types::{Position, Range};

/// Line start table for O(log n) offset ↔ position lookups.
///
/// # Examples
///
/// ```
/// use pkglens_core::position::LineIndex;
/// use tower_lsp_server::ls_types::Position;
///
/// let text = "{\n  \"name\": \"demo\"\n}";
/// let index = LineIndex::new(text);
///
/// let pos = index.position(text, 4);
/// assert_eq!(pos, Position::new(1, 2));
/// assert_eq!(index.offset(text, pos), Some(4));
/// ```
#[derive(Debug, Clone)]
pub struct LineIndex {
    offsets: Vec<usize>,
}

impl LineIndex {
    /// Builds the table in a single pass over `content`.
    pub fn new(content: &str) -> Self {
        let mut offsets = vec![0];
        for (i, c) in content.char_indices() {
            if c == '\n' {
                offsets.push(i + 1);
            }
        }
        Self { offsets }
    }

    /// Converts a byte offset to a line / UTF-16 column position.
    ///
    /// Offsets past the end of `content` are clamped to the end.
    pub fn position(&self, content: &str, offset: usize) -> Position {
        let offset = floor_char_boundary(content, offset.min(content.len()));
        let line = match self.offsets.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };
        let line_start = self.offsets[line];

        let character = content[line_start..offset]
            .chars()
            .map(|c| c.len_utf16() as u32)
            .sum();

        Position::new(line as u32, character)
    }

    /// Converts a byte span to an LSP range.
    pub fn range(&self, content: &str, start: usize, end: usize) -> Range {
        Range::new(self.position(content, start), self.position(content, end))
    }

    /// Converts an LSP position back to a byte offset.
    ///
    /// Returns `None` when the line does not exist. Columns past the end of
    /// the line are clamped to the line end.
    pub fn offset(&self, content: &str, position: Position) -> Option<usize> {
        let line_start = *self.offsets.get(position.line as usize)?;
        let line_end = self
            .offsets
            .get(position.line as usize + 1)
            .copied()
            .unwrap_or(content.len());

        let mut remaining = position.character;
        for (i, c) in content[line_start..line_end].char_indices() {
            if remaining == 0 || c == '\n' {
                return Some(line_start + i);
            }
            remaining = remaining.saturating_sub(c.len_utf16() as u32);
        }
        Some(line_end)
    }
}

fn floor_char_boundary(content: &str, mut offset: usize) -> usize {
    while !content.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Checks if a position lies within a range (inclusive start, exclusive end).
pub fn range_contains(range: Range, position: Position) -> bool {
    let after_start = position.line > range.start.line
        || (position.line == range.start.line && position.character >= range.start.character);
    let before_end = position.line < range.end.line
        || (position.line == range.end.line && position.character < range.end.character);
    after_start && before_end
}
