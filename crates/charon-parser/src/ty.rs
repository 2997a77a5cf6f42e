use charon_token::TokenKind;
use charon_tree::{GreenElement, NodeKind};

use crate::Parser;

impl<'a> Parser<'a> {
    /// `parse_type` covers struct, tuple, array, pointer, function-ref,
    /// and named-reference spellings. Built-in type names (`int`, `bool`,
    /// `ptr`, sized integers, ...) fall through to the reference case:
    /// they are plain identifiers here, classified later.
    pub(crate) fn parse_type(&mut self) -> GreenElement {
        match self.peek() {
            TokenKind::KwStruct => self.parse_type_struct(),
            TokenKind::LParen => self.parse_type_tuple(),
            TokenKind::LBracket => self.parse_type_array(),
            TokenKind::Star => self.parse_type_pointer(),
            TokenKind::KwFunction => {
                let kw = self.consume(TokenKind::KwFunction);
                self.parse_type_function(kw)
            }
            _ => self.parse_type_reference(),
        }
    }

    fn parse_type_struct(&mut self) -> GreenElement {
        let mut children = vec![self.consume(TokenKind::KwStruct), self.consume(TokenKind::LBrace)];
        while self.peek() != TokenKind::RBrace && self.peek() != TokenKind::Eof {
            children.push(self.consume(TokenKind::Identifier));
            children.push(self.consume(TokenKind::Colon));
            children.push(self.parse_type());
            match self.try_consume(TokenKind::Comma) {
                Some(comma) => children.push(comma),
                None => break,
            }
        }
        children.push(self.consume(TokenKind::RBrace));
        self.finish(NodeKind::TypeStruct, children)
    }

    fn parse_type_tuple(&mut self) -> GreenElement {
        let mut children = vec![self.consume(TokenKind::LParen)];
        while self.peek() != TokenKind::RParen && self.peek() != TokenKind::Eof {
            children.push(self.parse_type());
            match self.try_consume(TokenKind::Comma) {
                Some(comma) => children.push(comma),
                None => break,
            }
        }
        children.push(self.consume(TokenKind::RParen));
        self.finish(NodeKind::TypeTuple, children)
    }

    fn parse_type_array(&mut self) -> GreenElement {
        let mut children = vec![self.consume(TokenKind::LBracket)];
        children.push(self.parse_type());
        children.push(self.consume(TokenKind::RBracket));
        self.finish(NodeKind::TypeArray, children)
    }

    fn parse_type_pointer(&mut self) -> GreenElement {
        let mut children = vec![self.consume(TokenKind::Star)];
        children.push(self.parse_type());
        self.finish(NodeKind::TypePointer, children)
    }

    /// `(` (ident `:` type | `...`),* `)` [`:` type], given the leading
    /// `function` keyword already consumed by the caller. Shared by
    /// type-reference function signatures and, in principle, any other
    /// site that has already consumed its own `function` keyword.
    pub(crate) fn parse_type_function(&mut self, kw: GreenElement) -> GreenElement {
        let mut children = vec![kw, self.consume(TokenKind::LParen)];
        while self.peek() != TokenKind::RParen && self.peek() != TokenKind::Eof {
            if let Some(ellipsis) = self.try_consume(TokenKind::Ellipsis) {
                children.push(ellipsis);
            } else {
                children.push(self.consume(TokenKind::Identifier));
                children.push(self.consume(TokenKind::Colon));
                children.push(self.parse_type());
            }
            match self.try_consume(TokenKind::Comma) {
                Some(comma) => children.push(comma),
                None => break,
            }
        }
        children.push(self.consume(TokenKind::RParen));
        if let Some(colon) = self.try_consume(TokenKind::Colon) {
            children.push(colon);
            children.push(self.parse_type());
        }
        self.finish(NodeKind::TypeFunctionSignature, children)
    }

    fn parse_type_reference(&mut self) -> GreenElement {
        let mut children = vec![self.consume(TokenKind::Identifier)];
        while self.peek() == TokenKind::ColonColon {
            children.push(self.raw_consume());
            children.push(self.consume(TokenKind::Identifier));
        }
        if let Some(caret) = self.try_consume(TokenKind::Caret) {
            children.push(caret);
            loop {
                children.push(self.parse_type());
                match self.try_consume(TokenKind::Comma) {
                    Some(comma) => children.push(comma),
                    None => break,
                }
            }
            children.push(self.consume(TokenKind::Caret));
        }
        self.finish(NodeKind::TypeReference, children)
    }
}
