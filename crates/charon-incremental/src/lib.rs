//! Maintains one open document's syntax tree across a stream of edits.
//!
//! A full reparse is correct but wasteful for a single keystroke in a large
//! file. [`Document::apply_edit`] instead narrows each edit to the smallest
//! ancestor node that still contains it (its least common ancestor, or LCA),
//! reparses only that slice of text, and splices the resulting green subtree
//! back into place. Unaffected siblings are untouched `Rc`s, so the cost of
//! an edit tracks the size of the statement block it lands in rather than
//! the size of the file.

use std::cmp::Ordering;
use std::rc::Rc;

use charon_diagnostics::{DiagnosticList, Path};
use charon_parser::Parser;
use charon_position::{Position, PositionError, TextBuffer};
use charon_tree::{ElementCache, GreenElement, Kind, NodeKind, Red};

/// A single LSP-style text change: replace `[start, end)` with `text`.
#[derive(Debug, Clone)]
pub struct TextEdit {
    pub start: Position,
    pub end: Position,
    pub text: String,
}

/// One open file: its text, its current syntax tree, and the diagnostics
/// produced by whichever parses built the tree's surviving subtrees.
pub struct Document {
    cache: Rc<ElementCache>,
    buffer: TextBuffer,
    root: GreenElement,
    diagnostics: DiagnosticList,
}

impl Document {
    /// Parses `text` as a whole file and starts tracking it.
    pub fn open(text: &str) -> Self {
        let cache = Rc::new(ElementCache::new());
        let parser = Parser::new(text, Rc::clone(&cache));
        let output = parser.parse_root();
        tracing::debug!(bytes = text.len(), diagnostics = output.diagnostics.len(), "opened document");
        Self { cache, buffer: TextBuffer::new(text), root: output.root, diagnostics: output.diagnostics }
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn diagnostics(&self) -> &DiagnosticList {
        &self.diagnostics
    }

    /// A red facade onto the document's current tree, rooted at offset 0.
    pub fn red_root(&self) -> Rc<Red> {
        Red::wrap_root(self.root.clone())
    }

    /// Applies a single edit, reparsing only as much of the tree as the
    /// edit could have affected.
    ///
    /// 1. Translate `edit`'s line/character positions to byte offsets
    ///    against the document's current text.
    /// 2. Classify the edit: if either the replaced text or the replacement
    ///    text contains a brace, block boundaries may have shifted in ways
    ///    a narrowed reparse can't see, so the whole file is reparsed.
    /// 3. Otherwise, find the edit's narrowest containing node, then walk
    ///    up to the nearest enclosing `StmtBlock` (or the root).
    /// 4. If the edit reaches into that node's leading or trailing trivia,
    ///    it could re-attach trivia across the node's boundary, so widen
    ///    the target to the whole file.
    /// 5. Drop diagnostics scoped under the target node; the reparse below
    ///    produces their replacements.
    /// 6. Apply the edit to the text buffer.
    /// 7. Reparse the target node's new byte range in isolation.
    /// 8. Splice the fresh subtree into the green tree in place of the old
    ///    one, sharing every untouched sibling and ancestor.
    /// 9. Rebase the reparse's diagnostics onto the target's path and merge
    ///    them back in.
    pub fn apply_edit(&mut self, edit: TextEdit) -> Result<(), PositionError> {
        let old_text = self.buffer.text();
        let index = self.buffer.line_index();
        let start = index.position_to_offset(&old_text, edit.start)?;
        let end = index.position_to_offset(&old_text, edit.end)?;

        let force_full = edit.text.contains(['{', '}']) || old_text[start..end].contains(['{', '}']);

        let red_root = self.red_root();
        let (lca, lca_path) = if force_full {
            (Rc::clone(&red_root), Vec::new())
        } else {
            let (deepest, path) = deepest_node_containing(&red_root, start, end);
            nearest_stmt_block_or_root(&deepest, path)
        };
        let (lca, lca_path) = expand_for_trivia_edges(&red_root, lca, lca_path, start, end);
        let lca_path = Path::from_steps(lca_path);

        let removed = self.diagnostics.remove_descendants_of(&lca_path);
        tracing::trace!(removed, depth = lca_path.len(), kind = ?lca.kind(), "narrowed reparse target");

        self.buffer.edit(start, end, &edit.text);

        let lca_offset = lca.offset();
        let delta = edit.text.len() as isize - (end - start) as isize;
        let new_lca_len = (lca.len() as isize + delta).max(0) as usize;
        let new_text = self.buffer.text();
        let slice_end = (lca_offset + new_lca_len).min(new_text.len());
        let slice = &new_text[lca_offset..slice_end];

        let parser = Parser::new(slice, Rc::clone(&self.cache));
        let output = match lca.kind() {
            Kind::Node(NodeKind::Root) => parser.parse_root(),
            Kind::Node(NodeKind::StmtBlock) => parser.parse_stmt_block(),
            other => panic!("incremental reparse located an unsupported least-common-ancestor kind: {other:?}"),
        };

        self.root = splice(&self.cache, &self.root, lca_path.steps(), output.root);

        let mut new_diagnostics = output.diagnostics;
        new_diagnostics.rebase(&lca_path);
        self.diagnostics.extend(new_diagnostics);

        Ok(())
    }

    /// The printable name of the most specific token or node straddling
    /// `position`, or `None` if `position` doesn't land in the document.
    pub fn hover(&self, position: Position) -> Option<String> {
        let text = self.buffer.text();
        let offset = self.buffer.line_index().position_to_offset(&text, position).ok()?;
        let target = descend_to_offset(&self.red_root(), offset);
        Some(kind_name(target.kind()))
    }
}

/// Descends from `root` into whichever child fully contains `[start, end)`,
/// for as long as such a child is itself a node (an edit can never be
/// narrowed past a token). Returns the deepest such node and the path of
/// child indices taken to reach it.
fn deepest_node_containing(root: &Rc<Red>, start: usize, end: usize) -> (Rc<Red>, Vec<u32>) {
    let mut current = Rc::clone(root);
    let mut path = Vec::new();
    loop {
        let children = current.children();
        let hit = children
            .iter()
            .enumerate()
            .find(|(_, child)| matches!(child.kind(), Kind::Node(_)) && child.offset() <= start && end <= child.end());
        match hit {
            Some((index, child)) => {
                path.push(index as u32);
                current = Rc::clone(child);
            }
            None => return (current, path),
        }
    }
}

/// Walks up from `node` until reaching a `StmtBlock` or the root, since
/// those are the only two node kinds the parser can re-enter directly.
fn nearest_stmt_block_or_root(node: &Rc<Red>, mut path: Vec<u32>) -> (Rc<Red>, Vec<u32>) {
    let mut current = Rc::clone(node);
    loop {
        if matches!(current.kind(), Kind::Node(NodeKind::StmtBlock)) || current.parent().is_none() {
            return (current, path);
        }
        path.pop();
        current = Rc::clone(current.parent().expect("checked above"));
    }
}

/// If the edit reaches into `lca`'s leading or trailing trivia, its first or
/// last token could re-attach trivia across `lca`'s own boundary, which a
/// reparse confined to `lca` could never observe. Widen to the whole file
/// in that case.
fn expand_for_trivia_edges(root: &Rc<Red>, lca: Rc<Red>, lca_path: Vec<u32>, start: usize, end: usize) -> (Rc<Red>, Vec<u32>) {
    if matches!(lca.kind(), Kind::Node(NodeKind::Root)) {
        return (lca, lca_path);
    }
    let first = first_terminal(&lca);
    let last = last_terminal(&lca);
    if touches_leading_trivia(&first, start, end) || touches_trailing_trivia(&last, start, end) {
        return (Rc::clone(root), Vec::new());
    }
    (lca, lca_path)
}

fn first_terminal(node: &Rc<Red>) -> Rc<Red> {
    let mut current = Rc::clone(node);
    while !matches!(current.kind(), Kind::Token(_)) {
        match current.children().into_iter().next() {
            Some(child) => current = child,
            None => break,
        }
    }
    current
}

fn last_terminal(node: &Rc<Red>) -> Rc<Red> {
    let mut current = Rc::clone(node);
    while !matches!(current.kind(), Kind::Token(_)) {
        match current.children().into_iter().next_back() {
            Some(child) => current = child,
            None => break,
        }
    }
    current
}

fn touches_leading_trivia(token: &Rc<Red>, start: usize, end: usize) -> bool {
    token.leading_trivia().iter().any(|t| overlaps_or_touches(start, end, t.offset, t.end()))
}

fn touches_trailing_trivia(token: &Rc<Red>, start: usize, end: usize) -> bool {
    token.trailing_trivia().iter().any(|t| overlaps_or_touches(start, end, t.offset, t.end()))
}

fn overlaps_or_touches(edit_start: usize, edit_end: usize, piece_start: usize, piece_end: usize) -> bool {
    if edit_start == edit_end {
        edit_start >= piece_start && edit_start <= piece_end
    } else {
        edit_start < piece_end && piece_start < edit_end
    }
}

/// Rebuilds the spine from `element` down to `path`, replacing the element
/// that path names with `replacement` and re-interning every node along the
/// way. Every sibling not on the spine is carried over as the same `Rc`.
fn splice(cache: &ElementCache, element: &GreenElement, path: &[u32], replacement: GreenElement) -> GreenElement {
    let Some((&index, rest)) = path.split_first() else {
        return replacement;
    };
    let GreenElement::Node(node) = element else {
        unreachable!("a non-empty path cannot descend into a token");
    };
    let mut children: Vec<GreenElement> = node.children.to_vec();
    let index = index as usize;
    children[index] = splice(cache, &children[index], rest, replacement);
    GreenElement::Node(cache.make_node(node.kind, children))
}

fn descend_to_offset(root: &Rc<Red>, offset: usize) -> Rc<Red> {
    let mut current = Rc::clone(root);
    loop {
        if matches!(current.kind(), Kind::Token(_)) {
            return current;
        }
        let children = current.children();
        if children.is_empty() {
            return current;
        }
        let found = children.binary_search_by(|child| {
            if offset < child.offset() {
                Ordering::Greater
            } else if offset >= child.end() {
                Ordering::Less
            } else {
                Ordering::Equal
            }
        });
        match found {
            Ok(index) => current = Rc::clone(&children[index]),
            Err(_) => return current,
        }
    }
}

fn kind_name(kind: Kind) -> String {
    match kind {
        Kind::Token(t) => t.to_string(),
        Kind::Node(n) => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: u32, character: u32) -> Position {
        Position::new(line, character)
    }

    #[test]
    fn reparses_a_single_statement_inside_a_function_body() {
        let mut doc = Document::open("function main() {\n    let x: int = 1;\n}\n");
        assert!(doc.diagnostics().is_empty());

        // Replace the `1` in `let x: int = 1;` with `2`.
        let text = doc.text();
        let offset = text.find('1').unwrap();
        let before = &text[..offset];
        let line = before.matches('\n').count() as u32;
        let col = (offset - before.rfind('\n').map(|i| i + 1).unwrap_or(0)) as u32;

        doc.apply_edit(TextEdit { start: pos(line, col), end: pos(line, col + 1), text: "2".to_string() }).unwrap();

        assert!(doc.diagnostics().is_empty());
        assert_eq!(doc.text(), "function main() {\n    let x: int = 2;\n}\n");
    }

    #[test]
    fn inserting_a_brace_forces_a_full_reparse() {
        let mut doc = Document::open("function main() {\n    let x: int = 1;\n}\n");
        // Insert a stray `{` right after the function's own opening brace,
        // leaving the file's final `}` unmatched.
        doc.apply_edit(TextEdit { start: pos(0, 17), end: pos(0, 17), text: "{".to_string() }).unwrap();
        assert_eq!(doc.text(), "function main() {{\n    let x: int = 1;\n}\n");
        assert!(!doc.diagnostics().is_empty());
    }

    #[test]
    fn hover_names_the_token_under_the_cursor() {
        let doc = Document::open("function main() {\n    let x: int = 1;\n}\n");
        let name = doc.hover(pos(1, 9)).unwrap();
        assert_eq!(name, "Identifier");
    }

    #[test]
    fn out_of_range_position_is_reported_not_panicked() {
        let mut doc = Document::open("let x: int = 1;\n");
        let err = doc.apply_edit(TextEdit { start: pos(99, 0), end: pos(99, 0), text: "y".to_string() }).unwrap_err();
        assert!(matches!(err, PositionError::LineOutOfRange(99)));
    }
}
