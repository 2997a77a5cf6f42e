use ropey::Rope;

use crate::LineIndex;

/// A rope-backed source buffer that keeps its [`LineIndex`] in sync with its
/// text.
///
/// `TextBuffer` is the unit the incremental reparse driver edits: applying a
/// change mutates the rope in place and rebuilds the line index from the new
/// contents. Rebuilding the whole index on every edit is a deliberate
/// simplification (full `to_string` + rescan); the reparse driver's own
/// narrowing is what keeps incremental edits cheap, not a partially-updated
/// index.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    rope: Rope,
    line_index: LineIndex,
}

impl TextBuffer {
    pub fn new(text: &str) -> Self {
        let rope = Rope::from_str(text);
        let line_index = LineIndex::new(text);
        Self { rope, line_index }
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// Replaces the byte range `[start, end)` with `replacement` and rebuilds
    /// the line index against the resulting text.
    pub fn edit(&mut self, start: usize, end: usize, replacement: &str) {
        let start_char = self.rope.byte_to_char(start);
        let end_char = self.rope.byte_to_char(end);
        self.rope.remove(start_char..end_char);
        if !replacement.is_empty() {
            self.rope.insert(start_char, replacement);
        }
        let text = self.rope.to_string();
        self.line_index = LineIndex::new(&text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_replaces_range_and_rebuilds_index() {
        let mut buf = TextBuffer::new("fn a() {}\n");
        buf.edit(3, 4, "main");
        assert_eq!(buf.text(), "fn main() {}\n");
        assert_eq!(buf.line_index().line_count(), 2);
    }

    #[test]
    fn insert_at_end() {
        let mut buf = TextBuffer::new("x");
        buf.edit(1, 1, "y");
        assert_eq!(buf.text(), "xy");
    }
}
