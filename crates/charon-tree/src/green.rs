use std::cell::RefCell;
use std::rc::Rc;

use charon_token::{TokenKind, TriviaKind};

use crate::node::NodeKind;

/// A single piece of interned trivia. Never a standalone tree element; it
/// only ever appears in a [`GreenToken`]'s leading or trailing list.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct GreenTriviaData {
    pub kind: TriviaKind,
    pub text: Box<str>,
}

pub type GreenTrivia = Rc<GreenTriviaData>;

/// A single interned token: its kind, its own text, and the trivia attached
/// to either side of it.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct GreenTokenData {
    pub kind: TokenKind,
    pub text: Box<str>,
    pub leading: Box<[GreenTrivia]>,
    pub trailing: Box<[GreenTrivia]>,
    /// Leading trivia length + token text length + trailing trivia length.
    /// Cached so red-facade offset arithmetic never re-walks trivia lists.
    pub length: usize,
}

pub type GreenToken = Rc<GreenTokenData>;

/// An interned interior node: its grammar kind and its ordered children.
/// Children are always tokens or other nodes, never raw trivia.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct GreenNodeData {
    pub kind: NodeKind,
    pub children: Box<[GreenElement]>,
    pub length: usize,
}

pub type GreenNodeRc = Rc<GreenNodeData>;

/// A child of a [`GreenNodeData`]: either a token or another node.
///
/// Cloning is a pointer clone (`Rc::clone`); because every green element is
/// interned, two `GreenElement`s with equal structure are always the same
/// pointer, so `Rc::ptr_eq` and structural `PartialEq` agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GreenElement {
    Token(GreenToken),
    Node(GreenNodeRc),
}

impl GreenElement {
    pub fn length(&self) -> usize {
        match self {
            GreenElement::Token(t) => t.length,
            GreenElement::Node(n) => n.length,
        }
    }
}

fn fnv_seed() -> u64 {
    0xcbf2_9ce4_8422_2325
}

fn fnv_prime() -> u64 {
    0x0000_0001_0000_01b3
}

fn fnv_mix_bytes(mut hash: u64, bytes: &[u8]) -> u64 {
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(fnv_prime());
    }
    hash
}

fn fnv_mix_u64(hash: u64, value: u64) -> u64 {
    fnv_mix_bytes(hash, &value.to_le_bytes())
}

fn hash_trivia(kind: TriviaKind, text: &str) -> u64 {
    let hash = fnv_mix_u64(fnv_seed(), kind as u64);
    fnv_mix_bytes(hash, text.as_bytes())
}

fn hash_trivia_list(mut hash: u64, list: &[GreenTrivia]) -> u64 {
    for trivia in list {
        hash = fnv_mix_bytes(hash, trivia.text.as_bytes());
        hash = fnv_mix_u64(hash, trivia.kind as u64);
    }
    hash
}

fn hash_token(kind: TokenKind, text: &str, leading: &[GreenTrivia], trailing: &[GreenTrivia]) -> u64 {
    let hash = fnv_mix_u64(fnv_seed(), kind as u64);
    let hash = fnv_mix_bytes(hash, text.as_bytes());
    let hash = hash_trivia_list(hash, leading);
    hash_trivia_list(hash, trailing)
}

fn hash_node(kind: NodeKind, children: &[GreenElement]) -> u64 {
    let mut hash = fnv_mix_u64(fnv_seed(), kind as u64);
    for child in children {
        // Children are already-interned pointers: their address stands in
        // for their full structural hash, exactly like the original
        // element cache, which hashes child pointers rather than
        // recursively re-hashing already-deduplicated subtrees.
        let addr = match child {
            GreenElement::Token(t) => Rc::as_ptr(t) as usize as u64,
            GreenElement::Node(n) => Rc::as_ptr(n) as usize as u64,
        };
        hash = fnv_mix_u64(hash, addr);
    }
    hash
}

fn trivia_lists_ptr_eq(a: &[GreenTrivia], b: &[GreenTrivia]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Rc::ptr_eq(x, y))
}

fn children_ptr_eq(a: &[GreenElement], b: &[GreenElement]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(x, y)| match (x, y) {
            (GreenElement::Token(x), GreenElement::Token(y)) => Rc::ptr_eq(x, y),
            (GreenElement::Node(x), GreenElement::Node(y)) => Rc::ptr_eq(x, y),
            _ => false,
        })
}

const TRIVIA_BUCKET_COUNT: usize = 1024;
const TOKEN_BUCKET_COUNT: usize = 16384;
const NODE_BUCKET_COUNT: usize = 8192;

/// The interning cache that owns every [`GreenTrivia`], [`GreenToken`], and
/// [`GreenNodeData`] ever built for a file.
///
/// Each pool is a fixed-size bucket array with chaining on hash collision,
/// matching how the tree's structural-sharing invariant is maintained: a
/// `make_*` call either returns an existing `Rc` whose contents already
/// match, or allocates and links a new one.
pub struct ElementCache {
    trivia_buckets: Vec<RefCell<Vec<GreenTrivia>>>,
    token_buckets: Vec<RefCell<Vec<GreenToken>>>,
    node_buckets: Vec<RefCell<Vec<GreenNodeRc>>>,
}

impl Default for ElementCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementCache {
    pub fn new() -> Self {
        Self {
            trivia_buckets: (0..TRIVIA_BUCKET_COUNT).map(|_| RefCell::new(Vec::new())).collect(),
            token_buckets: (0..TOKEN_BUCKET_COUNT).map(|_| RefCell::new(Vec::new())).collect(),
            node_buckets: (0..NODE_BUCKET_COUNT).map(|_| RefCell::new(Vec::new())).collect(),
        }
    }

    /// Interns a piece of trivia, sharing via `&self` so a single cache can
    /// be handed out as `Rc<ElementCache>` to both the lexer and the
    /// parser.
    pub fn make_trivia(&self, kind: TriviaKind, text: &str) -> GreenTrivia {
        let hash = hash_trivia(kind, text);
        let mut bucket = self.trivia_buckets[(hash as usize) % TRIVIA_BUCKET_COUNT].borrow_mut();
        if let Some(existing) = bucket.iter().find(|t| t.kind == kind && &*t.text == text) {
            return Rc::clone(existing);
        }
        let fresh = Rc::new(GreenTriviaData { kind, text: text.into() });
        bucket.push(Rc::clone(&fresh));
        fresh
    }

    pub fn make_token(
        &self,
        kind: TokenKind,
        text: &str,
        leading: Vec<GreenTrivia>,
        trailing: Vec<GreenTrivia>,
    ) -> GreenToken {
        let hash = hash_token(kind, text, &leading, &trailing);
        let mut bucket = self.token_buckets[(hash as usize) % TOKEN_BUCKET_COUNT].borrow_mut();
        if let Some(existing) = bucket.iter().find(|t| {
            t.kind == kind
                && &*t.text == text
                && trivia_lists_ptr_eq(&t.leading, &leading)
                && trivia_lists_ptr_eq(&t.trailing, &trailing)
        }) {
            return Rc::clone(existing);
        }
        let length = leading.iter().map(|t| t.text.len()).sum::<usize>()
            + text.len()
            + trailing.iter().map(|t| t.text.len()).sum::<usize>();
        let fresh = Rc::new(GreenTokenData {
            kind,
            text: text.into(),
            leading: leading.into_boxed_slice(),
            trailing: trailing.into_boxed_slice(),
            length,
        });
        bucket.push(Rc::clone(&fresh));
        fresh
    }

    pub fn make_node(&self, kind: NodeKind, children: Vec<GreenElement>) -> GreenNodeRc {
        let hash = hash_node(kind, &children);
        let mut bucket = self.node_buckets[(hash as usize) % NODE_BUCKET_COUNT].borrow_mut();
        if let Some(existing) = bucket.iter().find(|n| n.kind == kind && children_ptr_eq(&n.children, &children)) {
            return Rc::clone(existing);
        }
        let length = children.iter().map(GreenElement::length).sum();
        let fresh = Rc::new(GreenNodeData { kind, children: children.into_boxed_slice(), length });
        bucket.push(Rc::clone(&fresh));
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_tokens_intern_to_the_same_pointer() {
        let cache = ElementCache::new();
        let a = cache.make_token(TokenKind::Identifier, "foo", vec![], vec![]);
        let b = cache.make_token(TokenKind::Identifier, "foo", vec![], vec![]);
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn different_text_does_not_intern_together() {
        let cache = ElementCache::new();
        let a = cache.make_token(TokenKind::Identifier, "foo", vec![], vec![]);
        let b = cache.make_token(TokenKind::Identifier, "bar", vec![], vec![]);
        assert!(!Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn identical_nodes_share_structure() {
        let cache = ElementCache::new();
        let tok_a = cache.make_token(TokenKind::IntegerLiteral, "1", vec![], vec![]);
        let tok_b = cache.make_token(TokenKind::IntegerLiteral, "1", vec![], vec![]);
        let node_a = cache.make_node(NodeKind::ExprLiteralNumeric, vec![GreenElement::Token(tok_a)]);
        let node_b = cache.make_node(NodeKind::ExprLiteralNumeric, vec![GreenElement::Token(tok_b)]);
        assert!(Rc::ptr_eq(&node_a, &node_b));
    }

    #[test]
    fn token_length_includes_trivia() {
        let cache = ElementCache::new();
        let ws = cache.make_trivia(charon_token::TriviaKind::Whitespace, "  ");
        let tok = cache.make_token(TokenKind::Identifier, "x", vec![ws], vec![]);
        assert_eq!(tok.length, 3);
    }
}
