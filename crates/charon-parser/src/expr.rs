use charon_diagnostics::DiagnosticKind;
use charon_token::TokenKind;
use charon_tree::{GreenElement, NodeKind};

use crate::Parser;

/// Binary precedence tiers, lowest first. Ties climb left-to-right
/// (left-associative); assignment is handled separately, above all of
/// these, since it is right-associative and has its own operator set.
fn binary_precedence(kind: TokenKind) -> Option<u8> {
    Some(match kind {
        TokenKind::PipePipe => 1,
        TokenKind::AmpAmp => 2,
        TokenKind::Pipe => 3,
        TokenKind::Caret => 4,
        TokenKind::Amp => 5,
        TokenKind::EqEq | TokenKind::NotEq => 6,
        TokenKind::Lt | TokenKind::Gt | TokenKind::LtEq | TokenKind::GtEq => 7,
        TokenKind::Shl | TokenKind::Shr => 8,
        TokenKind::Plus | TokenKind::Minus => 9,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 10,
        _ => return None,
    })
}

fn is_assignment_op(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Eq | TokenKind::PlusEq | TokenKind::MinusEq | TokenKind::StarEq | TokenKind::SlashEq | TokenKind::PercentEq | TokenKind::AmpEq
    )
}

impl<'a> Parser<'a> {
    pub(crate) fn parse_expr(&mut self) -> GreenElement {
        let left = self.parse_unary_pre();
        self.continue_expr_from(left)
    }

    /// Resumes expression parsing given a value that has already passed
    /// through postfix handling (or, for a bare leading identifier, the
    /// raw identifier token before its own suffix has even been looked
    /// at): completes whatever postfix/binary/assignment wrapping the
    /// value still needs. This is what lets a statement speculatively
    /// consume a leading identifier to check for a declaration's `:`, and
    /// fall back to finishing it as an ordinary expression without
    /// re-lexing or backtracking.
    pub(crate) fn continue_expr_from(&mut self, first: GreenElement) -> GreenElement {
        let primary = if is_identifier_token(&first) {
            self.continue_identifier(first)
        } else {
            first
        };
        let postfixed = self.continue_postfix_from(primary);
        let binary = self.continue_binary_from(postfixed, 1);
        self.continue_assignment_from(binary)
    }

    fn parse_assignment(&mut self) -> GreenElement {
        let left = self.parse_binary(1);
        self.continue_assignment_from(left)
    }

    fn continue_assignment_from(&mut self, left: GreenElement) -> GreenElement {
        if !is_assignment_op(self.peek()) {
            return left;
        }
        let op = self.raw_consume();
        let right = self.parse_assignment();
        self.finish(NodeKind::ExprAssignment, vec![left, op, right])
    }

    fn parse_binary(&mut self, min_prec: u8) -> GreenElement {
        let left = self.parse_unary_pre();
        self.continue_binary_from(left, min_prec)
    }

    fn continue_binary_from(&mut self, mut left: GreenElement, min_prec: u8) -> GreenElement {
        while let Some(prec) = binary_precedence(self.peek()) {
            if prec < min_prec {
                break;
            }
            let op = self.raw_consume();
            let right_start = self.parse_unary_pre();
            let right = self.continue_binary_from(right_start, prec + 1);
            left = self.finish(NodeKind::ExprBinary, vec![left, op, right]);
        }
        left
    }

    fn parse_unary_pre(&mut self) -> GreenElement {
        match self.peek() {
            TokenKind::Star | TokenKind::Minus | TokenKind::Bang | TokenKind::Amp => {
                let op = self.raw_consume();
                let operand = self.parse_unary_pre();
                self.finish(NodeKind::ExprUnary, vec![op, operand])
            }
            _ => {
                let primary = self.parse_primary();
                self.continue_postfix_from(primary)
            }
        }
    }

    /// The postfix loop: `as` casts, `[...]` subscripts, `(...)` calls,
    /// `.ident`/`.number` member access, and `->ident` pointer member
    /// access all chain onto `value` for as long as one keeps matching.
    fn continue_postfix_from(&mut self, mut value: GreenElement) -> GreenElement {
        loop {
            match self.peek() {
                TokenKind::KwAs => {
                    let as_kw = self.raw_consume();
                    let ty = self.parse_type();
                    value = self.finish(NodeKind::ExprCast, vec![value, as_kw, ty]);
                }
                TokenKind::LBracket => {
                    let lbracket = self.raw_consume();
                    let index = self.parse_expr();
                    let rbracket = self.consume(TokenKind::RBracket);
                    value = self.finish(NodeKind::ExprSubscript, vec![value, lbracket, index, rbracket]);
                }
                TokenKind::LParen => {
                    let mut children = vec![value, self.raw_consume()];
                    if let Some(rparen) = self.try_consume(TokenKind::RParen) {
                        children.push(rparen);
                    } else {
                        loop {
                            children.push(self.parse_expr());
                            match self.try_consume(TokenKind::Comma) {
                                Some(comma) => children.push(comma),
                                None => break,
                            }
                        }
                        children.push(self.consume(TokenKind::RParen));
                    }
                    value = self.finish(NodeKind::ExprCall, children);
                }
                TokenKind::Dot => {
                    let dot = self.raw_consume();
                    let member = if matches!(self.peek(), TokenKind::IntegerLiteral) {
                        self.raw_consume()
                    } else {
                        self.consume(TokenKind::Identifier)
                    };
                    value = self.finish(NodeKind::ExprSubscript, vec![value, dot, member]);
                }
                TokenKind::Arrow => {
                    let arrow = self.raw_consume();
                    let member = self.consume(TokenKind::Identifier);
                    value = self.finish(NodeKind::ExprSubscriptDeref, vec![value, arrow, member]);
                }
                _ => return value,
            }
        }
    }

    fn parse_primary(&mut self) -> GreenElement {
        match self.peek() {
            TokenKind::LParen => self.parse_paren_or_tuple(),
            TokenKind::KwSizeof => self.parse_sizeof(),
            TokenKind::Identifier => self.parse_identifier(),
            TokenKind::StringLiteral | TokenKind::RawStringLiteral => {
                let text = self.raw_consume();
                self.finish(NodeKind::ExprLiteralString, vec![text])
            }
            TokenKind::CharLiteral => {
                let text = self.raw_consume();
                self.finish(NodeKind::ExprLiteralChar, vec![text])
            }
            TokenKind::KwTrue | TokenKind::KwFalse => {
                let text = self.raw_consume();
                self.finish(NodeKind::ExprLiteralBool, vec![text])
            }
            TokenKind::IntegerLiteral | TokenKind::FloatLiteral => {
                let text = self.raw_consume();
                self.finish(NodeKind::ExprLiteralNumeric, vec![text])
            }
            _ => self.build_unexpected_error(DiagnosticKind::ExpectedCategory { category: "an expression", found: self.peek() }),
        }
    }

    fn parse_paren_or_tuple(&mut self) -> GreenElement {
        let lparen = self.raw_consume();
        let first = self.parse_expr();
        if let Some(comma) = self.try_consume(TokenKind::Comma) {
            let mut children = vec![lparen, first, comma];
            loop {
                children.push(self.parse_expr());
                match self.try_consume(TokenKind::Comma) {
                    Some(comma) => children.push(comma),
                    None => break,
                }
            }
            children.push(self.consume(TokenKind::RParen));
            return self.finish(NodeKind::ExprTuple, children);
        }
        let rparen = self.consume(TokenKind::RParen);
        self.finish(NodeKind::ExprParenthesized, vec![lparen, first, rparen])
    }

    fn parse_sizeof(&mut self) -> GreenElement {
        let sizeof_kw = self.raw_consume();
        let lparen = self.consume(TokenKind::LParen);
        let ty = self.parse_type();
        let rparen = self.consume(TokenKind::RParen);
        self.finish(NodeKind::ExprSizeof, vec![sizeof_kw, lparen, ty, rparen])
    }

    /// `ident`, optionally continued as a `::`-qualified selector, a
    /// `:^type,...^` generic-parameter variable, or a `{field=expr,...}`
    /// struct literal. Left ambiguous on purpose: a selector might name a
    /// module path or an enum value, and telling those apart needs
    /// information this layer doesn't have.
    fn parse_identifier(&mut self) -> GreenElement {
        let ident = self.consume(TokenKind::Identifier);
        self.continue_identifier(ident)
    }

    fn continue_identifier(&mut self, ident: GreenElement) -> GreenElement {
        if let Some(colon_colon) = self.try_consume(TokenKind::ColonColon) {
            let rhs = self.parse_identifier();
            return self.finish(NodeKind::ExprSelector, vec![ident, colon_colon, rhs]);
        }
        if let Some(colon) = self.try_consume(TokenKind::Colon) {
            let mut children = vec![ident, colon, self.consume(TokenKind::Caret)];
            loop {
                children.push(self.parse_type());
                match self.try_consume(TokenKind::Comma) {
                    Some(comma) => children.push(comma),
                    None => break,
                }
            }
            children.push(self.consume(TokenKind::Caret));
            return self.finish(NodeKind::ExprVariable, children);
        }
        if let Some(lbrace) = self.try_consume(TokenKind::LBrace) {
            let mut children = vec![ident, lbrace];
            if let Some(rbrace) = self.try_consume(TokenKind::RBrace) {
                children.push(rbrace);
            } else {
                loop {
                    children.push(self.consume(TokenKind::Identifier));
                    children.push(self.consume(TokenKind::Eq));
                    children.push(self.parse_expr());
                    match self.try_consume(TokenKind::Comma) {
                        Some(comma) => children.push(comma),
                        None => break,
                    }
                }
                children.push(self.consume(TokenKind::RBrace));
            }
            return self.finish(NodeKind::ExprLiteralStruct, children);
        }
        self.finish(NodeKind::ExprVariable, vec![ident])
    }
}

fn is_identifier_token(element: &GreenElement) -> bool {
    matches!(element, GreenElement::Token(t) if t.kind == TokenKind::Identifier)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use charon_diagnostics::DiagnosticList;
    use charon_tree::{ElementCache, Kind, NodeKind, Red};

    use crate::Parser;

    fn parse_block(text: &str) -> (Rc<Red>, DiagnosticList) {
        let cache = Rc::new(ElementCache::new());
        let output = Parser::new(text, cache).parse_stmt_block();
        (Red::wrap_root(output.root), output.diagnostics)
    }

    fn expr_stmt_inner(root: &Rc<Red>) -> Rc<Red> {
        // root -> StmtBlock[LBrace, Stmt[StmtExpression[expr, ;]], RBrace]
        let stmt_expr = root.children()[1].children()[0].clone();
        stmt_expr.children()[0].clone()
    }

    #[test]
    fn sizeof_of_a_named_type_parses_with_no_diagnostics() {
        let (root, diagnostics) = parse_block("{ sizeof(u32); }");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let sizeof_expr = expr_stmt_inner(&root);
        assert_eq!(sizeof_expr.kind(), Kind::Node(NodeKind::ExprSizeof));
    }

    #[test]
    fn raw_string_literal_is_a_single_token_expression() {
        let (root, diagnostics) = parse_block("{ r\"a\\b\"; }");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let literal = expr_stmt_inner(&root);
        assert_eq!(literal.kind(), Kind::Node(NodeKind::ExprLiteralString));
    }

    #[test]
    fn binary_expression_respects_precedence() {
        let (root, diagnostics) = parse_block("{ 1 + 2 * 3; }");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let top = expr_stmt_inner(&root);
        assert_eq!(top.kind(), Kind::Node(NodeKind::ExprBinary));
        // the outermost node must be the `+`, with `2 * 3` nested as its right operand.
        let right = top.children()[2].clone();
        assert_eq!(right.kind(), Kind::Node(NodeKind::ExprBinary));
    }
}
