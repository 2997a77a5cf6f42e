//! Top-down, error-recovering parser.
//!
//! Every production collects an ordered list of children (tokens consumed
//! directly, or other productions' finished nodes) and hands the list to
//! [`Parser::finish`], which interns the node. A malformed construct never
//! aborts the parse: [`Parser::consume`] and friends fall back to
//! inserting an `Error` node and recording a diagnostic, so the rest of
//! the file is always reachable.
//!
//! Diagnostics are recorded against a byte [`Span`] while a production is
//! mid-parse, since the tree around them is still being built and its
//! final shape (and therefore a stable child-index [`Path`] to the error)
//! isn't known yet. Once a top-level parse finishes, [`resolve_paths`]
//! walks the finished tree once and fills in each diagnostic's real path
//! by descending to whichever node's span contains it.

mod expr;
mod stmt;
mod tlc;
mod ty;

use std::rc::Rc;

use charon_diagnostics::{Diagnostic, DiagnosticKind, DiagnosticList, Path};
use charon_lexer::Lexer;
use charon_position::Span;
use charon_token::TokenKind;
use charon_tree::{ElementCache, GreenElement, Kind, NodeKind, Red};

/// The output of a single top-down parse: a tree plus whatever diagnostics
/// were recorded while building it.
pub struct ParseOutput {
    pub root: GreenElement,
    pub diagnostics: DiagnosticList,
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    cache: Rc<ElementCache>,
    sync_set: Vec<TokenKind>,
    diagnostics: DiagnosticList,
}

impl<'a> Parser<'a> {
    pub fn new(text: &'a str, cache: Rc<ElementCache>) -> Self {
        let lexer = Lexer::new(text, Rc::clone(&cache));
        Self { lexer, cache, sync_set: Vec::new(), diagnostics: DiagnosticList::new() }
    }

    /// Parses a whole file: the grammar entry point incremental reparse
    /// uses when the edit cannot be narrowed to a single block.
    pub fn parse_root(mut self) -> ParseOutput {
        let root = self.parse_root_inner();
        finish_output(root, self.diagnostics)
    }

    /// Parses a single `{ ... }` statement block: the grammar entry point
    /// incremental reparse uses when an edit's least common ancestor is
    /// itself a `StmtBlock`.
    pub fn parse_stmt_block(mut self) -> ParseOutput {
        let root = self.parse_stmt_block_inner();
        finish_output(root, self.diagnostics)
    }

    fn peek(&self) -> TokenKind {
        self.lexer.peek().kind
    }

    fn peek_span(&self) -> Span {
        self.lexer.peek().span
    }

    fn in_sync_set(&self, kind: TokenKind) -> bool {
        self.sync_set.contains(&kind)
    }

    /// Pushes tokens that should terminate error recovery early (e.g. the
    /// `}` closing the block a statement lives in) for the duration of a
    /// nested parse. Returns how many entries to pop via [`Self::pop_sync`].
    fn push_sync(&mut self, kinds: &[TokenKind]) -> usize {
        self.sync_set.extend_from_slice(kinds);
        kinds.len()
    }

    fn pop_sync(&mut self, count: usize) {
        let new_len = self.sync_set.len() - count;
        self.sync_set.truncate(new_len);
    }

    /// Unconditionally consumes the next token as a leaf child of the
    /// current production. Bytes the lexer could not classify are flagged
    /// here, since only the parser has enough context to attach a span to
    /// the diagnostic without disturbing the lexer's own token stream.
    fn raw_consume(&mut self) -> GreenElement {
        let span = self.peek_span();
        if self.peek() == TokenKind::Unknown {
            self.diagnostics.push(Diagnostic::new(Path::root(), span, DiagnosticKind::LexError));
        }
        let token = self.lexer.advance();
        GreenElement::Token(token)
    }

    fn try_consume(&mut self, expected: TokenKind) -> Option<GreenElement> {
        if self.peek() == expected {
            Some(self.raw_consume())
        } else {
            None
        }
    }

    /// Consumes `expected`, or records an `ExpectedToken` diagnostic and
    /// returns an `Error` node instead.
    fn consume(&mut self, expected: TokenKind) -> GreenElement {
        if let Some(element) = self.try_consume(expected) {
            return element;
        }
        self.build_unexpected_error(DiagnosticKind::ExpectedToken { expected, found: self.peek() })
    }

    /// Consumes the next token if `matches` accepts its kind, or records
    /// an `ExpectedCategory` diagnostic (e.g. "an identifier") and returns
    /// an `Error` node.
    fn consume_category(&mut self, category: &'static str, matches: impl Fn(TokenKind) -> bool) -> GreenElement {
        if matches(self.peek()) {
            self.raw_consume()
        } else {
            self.build_unexpected_error(DiagnosticKind::ExpectedCategory { category, found: self.peek() })
        }
    }

    /// Builds an `Error` node at the current position: consumes exactly
    /// one token unless it belongs to an enclosing construct's sync set,
    /// in which case the `Error` node is empty and parsing resumes at the
    /// current token without consuming it. The diagnostic's path is a
    /// placeholder until [`resolve_paths`] fills in the real one.
    fn build_unexpected_error(&mut self, kind: DiagnosticKind) -> GreenElement {
        let span = self.peek_span();
        self.diagnostics.push(Diagnostic::new(Path::root(), span, kind));

        let mut children = Vec::new();
        if self.peek() != TokenKind::Eof && !self.in_sync_set(self.peek()) {
            children.push(self.raw_consume());
        }
        self.finish(NodeKind::Error, children)
    }

    /// Interns `children` as a node of `kind`.
    fn finish(&mut self, kind: NodeKind, children: Vec<GreenElement>) -> GreenElement {
        let node = self.cache.make_node(kind, children);
        GreenElement::Node(node)
    }
}

fn finish_output(root: GreenElement, mut diagnostics: DiagnosticList) -> ParseOutput {
    resolve_paths(&root, &mut diagnostics);
    ParseOutput { root, diagnostics }
}

/// Fills in each diagnostic's real [`Path`] by walking `root` once,
/// descending at each node into whichever child's span contains the
/// diagnostic's own span. A node's children always partition its own span
/// exactly, so this always terminates at the most specific node or token
/// that contains the diagnostic.
fn resolve_paths(root: &GreenElement, diagnostics: &mut DiagnosticList) {
    if diagnostics.is_empty() {
        return;
    }
    let red_root = Red::wrap_root(root.clone());
    for diagnostic in diagnostics.iter_mut() {
        diagnostic.path = resolve_one_path(&red_root, diagnostic.span);
    }
}

fn resolve_one_path(root: &Rc<Red>, span: Span) -> Path {
    let mut steps = Vec::new();
    let mut current = Rc::clone(root);
    loop {
        if let Kind::Token(_) = current.kind() {
            break;
        }
        let children = current.children();
        if children.is_empty() {
            break;
        }
        let mut chosen = 0usize;
        for (idx, child) in children.iter().enumerate() {
            if child.offset() <= span.start {
                chosen = idx;
            } else {
                break;
            }
        }
        steps.push(chosen as u32);
        current = Rc::clone(&children[chosen]);
    }
    Path::from_steps(steps)
}

/// Parses `text` as a whole file, starting from an empty element cache.
pub fn parse_file(text: &str) -> (Rc<Red>, DiagnosticList) {
    let cache = Rc::new(ElementCache::new());
    let parser = Parser::new(text, Rc::clone(&cache));
    let output = parser.parse_root();
    (Red::wrap_root(output.root), output.diagnostics)
}
