use charon_diagnostics::DiagnosticKind;
use charon_token::TokenKind;
use charon_tree::{GreenElement, NodeKind};

use crate::Parser;

impl<'a> Parser<'a> {
    pub(crate) fn parse_root_inner(&mut self) -> GreenElement {
        let mut children = Vec::new();
        while self.peek() != TokenKind::Eof {
            children.push(self.parse_tlc());
        }
        children.push(self.consume(TokenKind::Eof));
        self.finish(NodeKind::Root, children)
    }

    fn parse_tlc(&mut self) -> GreenElement {
        match self.peek() {
            TokenKind::KwType => self.parse_type_definition(),
            TokenKind::KwModule => self.parse_module(),
            TokenKind::KwFunction => self.parse_function(),
            TokenKind::KwExtern => self.parse_extern(),
            TokenKind::KwEnum => self.parse_enum(),
            TokenKind::KwLet => self.parse_tlc_declaration(),
            _ => self.build_unexpected_error(DiagnosticKind::ExpectedCategory {
                category: "a top-level construct",
                found: self.peek(),
            }),
        }
    }

    fn parse_type_definition(&mut self) -> GreenElement {
        let mut children = vec![self.consume(TokenKind::KwType), self.consume(TokenKind::Identifier)];
        children.push(self.consume(TokenKind::Eq));
        children.push(self.parse_type());
        children.push(self.consume(TokenKind::Semicolon));
        self.finish(NodeKind::TlcTypeDefinition, children)
    }

    fn parse_module(&mut self) -> GreenElement {
        let mut children = vec![self.consume(TokenKind::KwModule), self.consume(TokenKind::Identifier)];
        children.push(self.consume(TokenKind::LBrace));
        let sync = self.push_sync(&[TokenKind::RBrace]);
        while self.peek() != TokenKind::RBrace && self.peek() != TokenKind::Eof {
            children.push(self.parse_tlc());
        }
        self.pop_sync(sync);
        children.push(self.consume(TokenKind::RBrace));
        self.finish(NodeKind::TlcModule, children)
    }

    fn parse_param_list(&mut self) -> Vec<GreenElement> {
        let mut children = vec![self.consume(TokenKind::LParen)];
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
        children
    }

    fn parse_function(&mut self) -> GreenElement {
        let mut children = vec![self.consume(TokenKind::KwFunction), self.consume(TokenKind::Identifier)];
        children.extend(self.parse_param_list());
        if let Some(colon) = self.try_consume(TokenKind::Colon) {
            children.push(colon);
            children.push(self.parse_type());
        }
        children.push(self.parse_stmt_block_inner());
        self.finish(NodeKind::TlcFunction, children)
    }

    fn parse_extern(&mut self) -> GreenElement {
        let mut children = vec![self.consume(TokenKind::KwExtern), self.consume(TokenKind::KwFunction), self.consume(TokenKind::Identifier)];
        children.extend(self.parse_param_list());
        if let Some(colon) = self.try_consume(TokenKind::Colon) {
            children.push(colon);
            children.push(self.parse_type());
        }
        children.push(self.consume(TokenKind::Semicolon));
        self.finish(NodeKind::TlcExtern, children)
    }

    fn parse_enum(&mut self) -> GreenElement {
        let mut children = vec![self.consume(TokenKind::KwEnum), self.consume(TokenKind::Identifier)];
        children.push(self.consume(TokenKind::LBrace));
        let sync = self.push_sync(&[TokenKind::RBrace]);
        while self.peek() != TokenKind::RBrace && self.peek() != TokenKind::Eof {
            children.push(self.consume(TokenKind::Identifier));
            match self.try_consume(TokenKind::Comma) {
                Some(comma) => children.push(comma),
                None => break,
            }
        }
        self.pop_sync(sync);
        children.push(self.consume(TokenKind::RBrace));
        self.finish(NodeKind::TlcEnum, children)
    }

    /// Top-level declarations always carry an explicit `: type`, unlike
    /// their statement-level counterpart where the type is optional.
    fn parse_tlc_declaration(&mut self) -> GreenElement {
        let mut children = vec![self.consume(TokenKind::KwLet), self.consume(TokenKind::Identifier), self.consume(TokenKind::Colon)];
        children.push(self.parse_type());
        if let Some(eq) = self.try_consume(TokenKind::Eq) {
            children.push(eq);
            children.push(self.parse_expr());
        }
        children.push(self.consume(TokenKind::Semicolon));
        self.finish(NodeKind::TlcDeclaration, children)
    }
}

#[cfg(test)]
mod tests {
    use charon_tree::Kind;

    use crate::parse_file;

    #[test]
    fn function_declaration_with_return_type_parses_cleanly() {
        let (root, diagnostics) = parse_file("function f() : u32 { return 0; }");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let children = root.children();
        // one `TlcFunction` tlc, plus the trailing `Eof` token.
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].kind(), Kind::Node(NodeKind::TlcFunction));
    }

    #[test]
    fn top_level_declaration_requires_the_let_keyword() {
        let (root, diagnostics) = parse_file("let x: int = 1;");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(root.children()[0].kind(), Kind::Node(NodeKind::TlcDeclaration));
    }

    #[test]
    fn bare_identifier_at_top_level_is_not_a_declaration() {
        let (root, diagnostics) = parse_file("x: int = 1;");
        assert!(!diagnostics.is_empty(), "a top-level statement must start with `let`");
        assert_eq!(root.children()[0].kind(), Kind::Node(NodeKind::Error));
    }

    #[test]
    fn extern_function_spells_the_function_keyword() {
        let (root, diagnostics) = parse_file("extern function puts(s: ptr) : int;");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(root.children()[0].kind(), Kind::Node(NodeKind::TlcExtern));
    }

    #[test]
    fn struct_type_requires_the_struct_keyword() {
        let (root, diagnostics) = parse_file("type point = struct { x: int, y: int };");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(root.children()[0].kind(), Kind::Node(NodeKind::TlcTypeDefinition));
    }

    #[test]
    fn module_nests_a_let_declaration() {
        let (root, diagnostics) = parse_file("module m { let x: int = 1; }");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(root.children()[0].kind(), Kind::Node(NodeKind::TlcModule));
    }
}
