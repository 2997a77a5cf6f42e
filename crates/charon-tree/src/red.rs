use std::rc::Rc;

use charon_token::{TokenKind, TriviaKind};

use crate::green::{GreenElement, GreenTrivia};
use crate::node::NodeKind;

/// The grammar or lexical kind of a [`Red`] element, without its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Token(TokenKind),
    Node(NodeKind),
}

/// A positioned, non-owning view onto a green element.
///
/// Red elements are built on demand and never cached by their parent: each
/// call to [`Red::children`] allocates fresh child facades whose `parent`
/// field points back at (a clone of) `self`. Because the direction of
/// ownership is strictly child-to-parent, this can never form an `Rc`
/// cycle, even though navigating to a parent is just as cheap as
/// navigating to a child.
#[derive(Clone)]
pub struct Red {
    green: GreenElement,
    offset: usize,
    parent: Option<Rc<Red>>,
}

impl Red {
    /// Wraps `green` as the root of a tree, at offset 0 with no parent.
    pub fn wrap_root(green: GreenElement) -> Rc<Red> {
        Rc::new(Red { green, offset: 0, parent: None })
    }

    pub fn kind(&self) -> Kind {
        match &self.green {
            GreenElement::Token(t) => Kind::Token(t.kind),
            GreenElement::Node(n) => Kind::Node(n.kind),
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.green.length()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn end(&self) -> usize {
        self.offset + self.len()
    }

    pub fn parent(&self) -> Option<&Rc<Red>> {
        self.parent.as_ref()
    }

    pub fn green(&self) -> &GreenElement {
        &self.green
    }

    /// Text of this element including its own leading/trailing trivia if
    /// it is a token, or the concatenation of its descendants' text if it
    /// is a node. Either way, lossless: reassembling every token's text in
    /// document order reproduces the original file exactly.
    pub fn text(&self) -> String {
        match &self.green {
            GreenElement::Token(t) => {
                let mut out = String::with_capacity(t.length);
                for trivia in t.leading.iter() {
                    out.push_str(&trivia.text);
                }
                out.push_str(&t.text);
                for trivia in t.trailing.iter() {
                    out.push_str(&trivia.text);
                }
                out
            }
            GreenElement::Node(n) => {
                let mut out = String::new();
                for child in n.children.iter() {
                    out.push_str(&Self::child_text(child));
                }
                out
            }
        }
    }

    fn child_text(child: &GreenElement) -> String {
        match child {
            GreenElement::Token(_) => {
                let wrapped = Red { green: child.clone(), offset: 0, parent: None };
                wrapped.text()
            }
            GreenElement::Node(_) => {
                let wrapped = Red { green: child.clone(), offset: 0, parent: None };
                wrapped.text()
            }
        }
    }

    /// Children of this element, positioned within the whole file. Empty
    /// for tokens: a token's leading/trailing trivia are reached via
    /// [`Red::leading_trivia`]/[`Red::trailing_trivia`], not `children`.
    pub fn children(self: &Rc<Self>) -> Vec<Rc<Red>> {
        let GreenElement::Node(node) = &self.green else {
            return Vec::new();
        };
        let mut offset = self.offset;
        let mut out = Vec::with_capacity(node.children.len());
        for child in node.children.iter() {
            let child_red = Rc::new(Red {
                green: child.clone(),
                offset,
                parent: Some(Rc::clone(self)),
            });
            offset += child.length();
            out.push(child_red);
        }
        out
    }

    /// The `n`th child, if this is a node with at least `n + 1` children.
    pub fn child(self: &Rc<Self>, n: usize) -> Option<Rc<Red>> {
        self.children().into_iter().nth(n)
    }

    pub fn child_count(&self) -> usize {
        match &self.green {
            GreenElement::Node(n) => n.children.len(),
            GreenElement::Token(_) => 0,
        }
    }

    /// This token's leading trivia, positioned immediately before its own
    /// text.
    pub fn leading_trivia(&self) -> Vec<RedTrivia> {
        let GreenElement::Token(token) = &self.green else {
            return Vec::new();
        };
        wrap_trivia_list(&token.leading, self.offset)
    }

    /// This token's trailing trivia, positioned immediately after its own
    /// text.
    pub fn trailing_trivia(&self) -> Vec<RedTrivia> {
        let GreenElement::Token(token) = &self.green else {
            return Vec::new();
        };
        let leading_len: usize = token.leading.iter().map(|t| t.text.len()).sum();
        let trailing_start = self.offset + leading_len + token.text.len();
        wrap_trivia_list(&token.trailing, trailing_start)
    }
}

fn wrap_trivia_list(list: &[GreenTrivia], mut offset: usize) -> Vec<RedTrivia> {
    let mut out = Vec::with_capacity(list.len());
    for trivia in list {
        out.push(RedTrivia { kind: trivia.kind, text: trivia.text.clone().into(), offset });
        offset += trivia.text.len();
    }
    out
}

/// A positioned view onto a single piece of trivia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedTrivia {
    pub kind: TriviaKind,
    pub text: Rc<str>,
    pub offset: usize,
}

impl RedTrivia {
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::green::ElementCache;

    #[test]
    fn root_offset_is_zero_and_children_chain_offsets() {
        let cache = ElementCache::new();
        let a = GreenElement::Token(cache.make_token(TokenKind::Identifier, "ab", vec![], vec![]));
        let b = GreenElement::Token(cache.make_token(TokenKind::Identifier, "cde", vec![], vec![]));
        let node = cache.make_node(NodeKind::ExprTuple, vec![a, b]);
        let root = Red::wrap_root(GreenElement::Node(node));
        assert_eq!(root.offset(), 0);
        let children = root.children();
        assert_eq!(children[0].offset(), 0);
        assert_eq!(children[1].offset(), 2);
        assert_eq!(children[1].end(), 5);
    }

    #[test]
    fn parent_navigation_round_trips() {
        let cache = ElementCache::new();
        let a = GreenElement::Token(cache.make_token(TokenKind::Identifier, "x", vec![], vec![]));
        let node = cache.make_node(NodeKind::ExprTuple, vec![a]);
        let root = Red::wrap_root(GreenElement::Node(node));
        let child = root.child(0).unwrap();
        assert!(Rc::ptr_eq(child.parent().unwrap(), &root));
    }

    #[test]
    fn trailing_trivia_offset_follows_token_text() {
        let cache = ElementCache::new();
        let ws = cache.make_trivia(TriviaKind::Whitespace, " ");
        let tok = cache.make_token(TokenKind::Identifier, "x", vec![], vec![ws]);
        let root = Red::wrap_root(GreenElement::Token(tok));
        let trailing = root.trailing_trivia();
        assert_eq!(trailing[0].offset, 1);
        assert_eq!(trailing[0].end(), 2);
    }

    #[test]
    fn text_reassembles_losslessly() {
        let cache = ElementCache::new();
        let lead = cache.make_trivia(TriviaKind::Whitespace, "  ");
        let tok_a = cache.make_token(TokenKind::Identifier, "x", vec![lead], vec![]);
        let trail = cache.make_trivia(TriviaKind::Whitespace, " ");
        let tok_b = cache.make_token(TokenKind::Plus, "+", vec![], vec![trail]);
        let node = cache.make_node(
            NodeKind::ExprBinary,
            vec![GreenElement::Token(tok_a), GreenElement::Token(tok_b)],
        );
        let root = Red::wrap_root(GreenElement::Node(node));
        assert_eq!(root.text(), "  x+ ");
    }
}
