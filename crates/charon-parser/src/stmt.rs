use charon_token::TokenKind;
use charon_tree::{GreenElement, NodeKind};

use crate::Parser;

impl<'a> Parser<'a> {
    pub(crate) fn parse_stmt_block_inner(&mut self) -> GreenElement {
        let mut children = vec![self.consume(TokenKind::LBrace)];
        let sync = self.push_sync(&[TokenKind::RBrace]);
        while self.peek() != TokenKind::RBrace && self.peek() != TokenKind::Eof {
            children.push(self.parse_stmt());
        }
        self.pop_sync(sync);
        children.push(self.consume(TokenKind::RBrace));
        self.finish(NodeKind::StmtBlock, children)
    }

    /// Every statement is wrapped in a `Stmt` node regardless of its inner
    /// kind, including the bare `;` empty statement.
    pub(crate) fn parse_stmt(&mut self) -> GreenElement {
        let inner = match self.peek() {
            TokenKind::Semicolon => {
                let semi = self.consume(TokenKind::Semicolon);
                self.finish(NodeKind::StmtEmpty, vec![semi])
            }
            TokenKind::LBrace => self.parse_stmt_block_inner(),
            TokenKind::KwReturn => self.parse_return(),
            TokenKind::KwIf => self.parse_if(),
            TokenKind::KwWhile => self.parse_while(),
            TokenKind::KwFor => self.parse_for(),
            TokenKind::KwSwitch => self.parse_switch(),
            TokenKind::KwContinue => self.parse_continue(),
            TokenKind::KwBreak => self.parse_break(),
            TokenKind::KwLet => self.parse_declaration(),
            _ => self.parse_expr_stmt(),
        };
        self.finish(NodeKind::Stmt, vec![inner])
    }

    /// `let ident [: type] [= expr];`. The type annotation is optional at
    /// statement level, unlike its top-level counterpart.
    fn parse_declaration(&mut self) -> GreenElement {
        let mut children = vec![self.consume(TokenKind::KwLet), self.consume(TokenKind::Identifier)];
        if let Some(colon) = self.try_consume(TokenKind::Colon) {
            children.push(colon);
            children.push(self.parse_type());
        }
        if let Some(eq) = self.try_consume(TokenKind::Eq) {
            children.push(eq);
            children.push(self.parse_expr());
        }
        children.push(self.consume(TokenKind::Semicolon));
        self.finish(NodeKind::StmtDeclaration, children)
    }

    fn parse_expr_stmt(&mut self) -> GreenElement {
        let expr = self.parse_expr();
        let semi = self.consume(TokenKind::Semicolon);
        self.finish(NodeKind::StmtExpression, vec![expr, semi])
    }

    fn parse_return(&mut self) -> GreenElement {
        let mut children = vec![self.consume(TokenKind::KwReturn)];
        if self.peek() != TokenKind::Semicolon {
            children.push(self.parse_expr());
        }
        children.push(self.consume(TokenKind::Semicolon));
        self.finish(NodeKind::StmtReturn, children)
    }

    fn parse_if(&mut self) -> GreenElement {
        let mut children = vec![self.consume(TokenKind::KwIf), self.consume(TokenKind::LParen)];
        children.push(self.parse_expr());
        children.push(self.consume(TokenKind::RParen));
        children.push(self.parse_stmt());
        if let Some(else_kw) = self.try_consume(TokenKind::KwElse) {
            children.push(else_kw);
            children.push(self.parse_stmt());
        }
        self.finish(NodeKind::StmtIf, children)
    }

    fn parse_while(&mut self) -> GreenElement {
        let mut children = vec![self.consume(TokenKind::KwWhile)];
        let parenthesized = self.try_consume(TokenKind::LParen);
        if let Some(lparen) = parenthesized {
            children.push(lparen);
            children.push(self.parse_expr());
            children.push(self.consume(TokenKind::RParen));
        } else {
            children.push(self.parse_expr());
        }
        children.push(self.parse_stmt());
        self.finish(NodeKind::StmtWhile, children)
    }

    fn parse_for(&mut self) -> GreenElement {
        let mut children = vec![self.consume(TokenKind::KwFor), self.consume(TokenKind::LParen)];
        if self.peek() != TokenKind::Semicolon {
            children.push(self.parse_for_init());
        }
        children.push(self.consume(TokenKind::Semicolon));
        if self.peek() != TokenKind::Semicolon {
            children.push(self.parse_expr());
        }
        children.push(self.consume(TokenKind::Semicolon));
        if self.peek() != TokenKind::RParen {
            children.push(self.parse_expr());
        }
        children.push(self.consume(TokenKind::RParen));
        children.push(self.parse_stmt());
        self.finish(NodeKind::StmtFor, children)
    }

    /// The `for` loop's init clause may be a `let` declaration or a bare
    /// expression, and unlike every other declaration site it is not
    /// itself terminated by the `;` that ends the clause (the loop
    /// header's own `;` does that job instead).
    fn parse_for_init(&mut self) -> GreenElement {
        if self.peek() != TokenKind::KwLet {
            return self.parse_expr();
        }
        let mut children = vec![self.consume(TokenKind::KwLet), self.consume(TokenKind::Identifier)];
        if let Some(colon) = self.try_consume(TokenKind::Colon) {
            children.push(colon);
            children.push(self.parse_type());
        }
        if let Some(eq) = self.try_consume(TokenKind::Eq) {
            children.push(eq);
            children.push(self.parse_expr());
        }
        self.finish(NodeKind::StmtDeclaration, children)
    }

    fn parse_switch(&mut self) -> GreenElement {
        let mut children = vec![self.consume(TokenKind::KwSwitch), self.consume(TokenKind::LParen)];
        children.push(self.parse_expr());
        children.push(self.consume(TokenKind::RParen));
        children.push(self.consume(TokenKind::LBrace));
        let sync = self.push_sync(&[TokenKind::RBrace]);
        while self.peek() != TokenKind::RBrace && self.peek() != TokenKind::Eof {
            children.push(self.parse_switch_case());
        }
        self.pop_sync(sync);
        children.push(self.consume(TokenKind::RBrace));
        self.finish(NodeKind::StmtSwitch, children)
    }

    fn parse_switch_case(&mut self) -> GreenElement {
        let mut children = Vec::new();
        if let Some(default_kw) = self.try_consume(TokenKind::KwDefault) {
            children.push(default_kw);
        } else {
            children.push(self.parse_expr());
        }
        children.push(self.consume(TokenKind::FatArrow));
        children.push(self.parse_stmt());
        self.finish(NodeKind::StmtSwitchCase, children)
    }

    fn parse_continue(&mut self) -> GreenElement {
        let children = vec![self.consume(TokenKind::KwContinue), self.consume(TokenKind::Semicolon)];
        self.finish(NodeKind::StmtContinue, children)
    }

    fn parse_break(&mut self) -> GreenElement {
        let children = vec![self.consume(TokenKind::KwBreak), self.consume(TokenKind::Semicolon)];
        self.finish(NodeKind::StmtBreak, children)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use charon_diagnostics::{DiagnosticKind, DiagnosticList};
    use charon_tree::{ElementCache, Kind, NodeKind, Red};

    use crate::Parser;

    fn parse_block(text: &str) -> (Rc<Red>, DiagnosticList) {
        let cache = Rc::new(ElementCache::new());
        let output = Parser::new(text, cache).parse_stmt_block();
        (Red::wrap_root(output.root), output.diagnostics)
    }

    #[test]
    fn declaration_with_a_missing_initializer_reports_an_expected_expression() {
        let (root, diagnostics) = parse_block("{ let x = ; }");
        assert!(!diagnostics.is_empty(), "a missing initializer must be diagnosed");
        let kind = &diagnostics.iter().next().unwrap().kind;
        assert!(matches!(kind, DiagnosticKind::ExpectedCategory { category: "an expression", .. }));
        // recovery still produces a whole, closed block around the malformed declaration.
        let stmt = root.children()[1].children()[0].clone();
        assert_eq!(stmt.kind(), Kind::Node(NodeKind::StmtDeclaration));
    }

    #[test]
    fn plain_expression_statement_needs_no_let_keyword() {
        let (_root, diagnostics) = parse_block("{ f(1, 2); }");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }

    #[test]
    fn for_loop_init_accepts_a_let_declaration() {
        let (root, diagnostics) = parse_block("{ for (let i: int = 0; i; i) {} }");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let stmt_for = root.children()[1].children()[0].clone();
        assert_eq!(stmt_for.kind(), Kind::Node(NodeKind::StmtFor));
    }

    #[test]
    fn declaration_type_annotation_is_optional_at_statement_level() {
        let (_root, diagnostics) = parse_block("{ let x = 1; }");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }
}
