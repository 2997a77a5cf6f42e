//! Byte-offset/line-column conversions over Charon source text.
//!
//! A [`LineIndex`] maps byte offsets to LSP-style `(line, UTF-16 character)`
//! positions and back. [`TextBuffer`] wraps a [`ropey::Rope`] so the
//! incremental reparse driver can apply edits without re-scanning the whole
//! file for line boundaries on every keystroke.

mod buffer;
mod line_index;

pub use buffer::TextBuffer;
pub use line_index::LineIndex;

use serde::{Deserialize, Serialize};

/// A zero-based line/character position, UTF-16 code units per line as LSP
/// requires. A 4-byte UTF-8 lead byte counts as two UTF-16 units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A half-open byte range `[start, end)` into a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Errors raised when translating between byte offsets and line/character
/// positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error("line {0} is out of range")]
    LineOutOfRange(u32),
    #[error("character {character} is out of range on line {line}")]
    CharacterOutOfRange { line: u32, character: u32 },
    #[error("byte offset {0} is out of range")]
    OffsetOutOfRange(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_len_and_is_empty() {
        let s = Span::new(4, 9);
        assert_eq!(s.len(), 5);
        assert!(!s.is_empty());
        assert!(Span::new(3, 3).is_empty());
    }
}
