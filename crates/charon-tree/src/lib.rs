//! The interned, lossless red-green syntax tree.
//!
//! "Green" elements ([`GreenTrivia`], [`GreenToken`], [`GreenNodeData`]) are
//! interned by [`ElementCache`] so that structurally identical subtrees are
//! the same `Rc` pointer; "red" elements ([`Red`]) are positioned, on-demand
//! facades computed from a green tree plus a starting offset. Reassembling
//! the text of every token under the root in document order reproduces the
//! source file exactly, including whitespace and comments.

mod green;
mod node;
mod red;

pub use green::{ElementCache, GreenElement, GreenNodeData, GreenNodeRc, GreenToken, GreenTokenData, GreenTrivia, GreenTriviaData};
pub use node::NodeKind;
pub use red::{Kind, Red, RedTrivia};
