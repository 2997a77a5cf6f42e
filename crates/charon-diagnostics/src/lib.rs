//! Diagnostic paths and error records.
//!
//! A [`Path`] names a node in a syntax tree by the sequence of child indices
//! you would follow from the root to reach it, rather than by a pointer.
//! Paths are what let the incremental reparse driver cull and rebase
//! diagnostics that belong to a subtree being replaced without walking the
//! tree itself.

mod path;

pub use path::Path;

use charon_position::Span;
use charon_token::TokenKind;

/// A single recorded problem in a source file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    pub path: Path,
    pub span: Span,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(path: Path, span: Span, kind: DiagnosticKind) -> Self {
        Self { path, span, kind }
    }
}

/// The reason a [`Diagnostic`] was recorded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum DiagnosticKind {
    /// The lexer consumed a byte it could not classify as any token.
    #[error("unexpected byte while scanning a token")]
    LexError,

    /// The parser expected one specific token kind and found another.
    #[error("expected {expected}, found {found}")]
    ExpectedToken { expected: TokenKind, found: TokenKind },

    /// The parser expected any token from a named category (e.g. "a type",
    /// "an expression") and found a token outside that category.
    #[error("expected {category}, found {found}")]
    ExpectedCategory { category: &'static str, found: TokenKind },

    /// A literal token's text could not be interpreted as the literal kind
    /// its token kind promises, e.g. an integer literal with a digit out
    /// of range for its radix.
    #[error("invalid literal: {message}")]
    LiteralError { message: String },

    /// A grammar-level well-formedness rule was violated in a way that
    /// doesn't reduce to a single expected/found token, e.g. a duplicate
    /// `default` arm in a `switch`.
    #[error("malformed construct: {message}")]
    StructuralError { message: String },
}

/// An ordered collection of [`Diagnostic`]s for one file, in the order they
/// were produced during parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticList {
    items: Vec<Diagnostic>,
}

impl DiagnosticList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Diagnostic> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Removes every diagnostic whose path is `prefix` or a descendant of
    /// it, returning how many were removed. Used when an incremental
    /// reparse replaces the subtree at `prefix`: its old diagnostics are no
    /// longer valid and the fresh reparse will produce their replacements.
    pub fn remove_descendants_of(&mut self, prefix: &Path) -> usize {
        let before = self.items.len();
        self.items.retain(|d| !d.path.starts_with(prefix));
        before - self.items.len()
    }

    /// Prepends `prefix` to the path of every diagnostic, e.g. after
    /// reparsing a subtree whose root is itself `prefix` levels deep.
    pub fn rebase(&mut self, prefix: &Path) {
        for diagnostic in &mut self.items {
            diagnostic.path = prefix.join(&diagnostic.path);
        }
    }

    pub fn extend(&mut self, other: DiagnosticList) {
        self.items.extend(other.items);
    }
}

impl IntoIterator for DiagnosticList {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
