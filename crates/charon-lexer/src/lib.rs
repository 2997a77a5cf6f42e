//! The lexer: turns source text into a stream of interned green tokens.
//!
//! Matching is ordered, not longest-match: multi-character operators are
//! tried before the single-character operators they start with, and
//! keywords are recognized only after the full identifier has been
//! scanned. The lexer caches exactly one token of lookahead, refilled on
//! every [`Lexer::advance`], so the parser can always `peek` the next
//! token's kind without consuming it.
//!
//! Each token the lexer produces is already interned (a [`GreenToken`]),
//! not a bare text record: the parser pushes the lexer's output straight
//! into its element collector. [`TokenRecord`] is the lightweight summary
//! the parser actually inspects to make grammar decisions, so it never has
//! to dereference the green token just to check its kind or span.

use std::rc::Rc;

use charon_position::Span;
use charon_token::{TokenKind, TriviaKind};
use charon_tree::{ElementCache, GreenToken};

/// A lightweight, copyable summary of a token: enough for the parser to
/// make a decision without touching the interned green element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenRecord {
    pub kind: TokenKind,
    pub span: Span,
}

struct TriviaPiece {
    kind: TriviaKind,
    text: String,
}

/// Scans `text` on demand, interning each token through a shared
/// [`ElementCache`] as it is produced.
pub struct Lexer<'a> {
    text: &'a str,
    pos: usize,
    cache: Rc<ElementCache>,
    pending_leading: Vec<TriviaPiece>,
    lookahead: Option<(TokenRecord, GreenToken)>,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str, cache: Rc<ElementCache>) -> Self {
        let mut lexer = Self { text, pos: 0, cache, pending_leading: Vec::new(), lookahead: None };
        lexer.pending_leading = lexer.scan_trivia_run();
        lexer.fill_lookahead();
        lexer
    }

    /// The kind and span of the next token, without consuming it.
    pub fn peek(&self) -> TokenRecord {
        match self.lookahead.as_ref() {
            Some((record, _)) => *record,
            None => unreachable!("lexer always keeps one token of lookahead"),
        }
    }

    /// Consumes and returns the next token's already-interned green
    /// element, refilling the lookahead from the remaining input.
    pub fn advance(&mut self) -> GreenToken {
        let (_, green) = match self.lookahead.take() {
            Some(pair) => pair,
            None => unreachable!("lexer always keeps one token of lookahead"),
        };
        self.fill_lookahead();
        green
    }

    fn fill_lookahead(&mut self) {
        let leading = std::mem::take(&mut self.pending_leading);
        let leading_green = self.intern_trivia_list(leading);

        let token_start = self.pos;
        let (kind, token_text) = self.scan_raw();

        let trivia_after = self.scan_trivia_run();
        let (trailing, remainder) = split_trailing(trivia_after);
        self.pending_leading = remainder;
        let trailing_green = self.intern_trivia_list(trailing);

        let green = self.cache.make_token(kind, token_text, leading_green, trailing_green);
        let record = TokenRecord { kind, span: Span::new(token_start, token_start + token_text.len()) };
        self.lookahead = Some((record, green));
    }

    fn intern_trivia_list(&self, pieces: Vec<TriviaPiece>) -> Vec<charon_tree::GreenTrivia> {
        pieces
            .into_iter()
            .map(|p| self.cache.make_trivia(p.kind, &p.text))
            .collect()
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn scan_trivia_run(&mut self) -> Vec<TriviaPiece> {
        let mut pieces = Vec::new();
        loop {
            let rest = self.rest();
            let mut chars = rest.char_indices();
            let Some((_, first)) = chars.next() else { break };
            if first == '\n' {
                self.pos += 1;
                pieces.push(TriviaPiece { kind: TriviaKind::Newline, text: "\n".to_string() });
            } else if first == '\r' && rest.as_bytes().get(1) == Some(&b'\n') {
                self.pos += 2;
                pieces.push(TriviaPiece { kind: TriviaKind::Newline, text: "\r\n".to_string() });
            } else if first == ' ' || first == '\t' {
                let len = rest.bytes().take_while(|&b| b == b' ' || b == b'\t').count();
                self.pos += len;
                pieces.push(TriviaPiece { kind: TriviaKind::Whitespace, text: rest[..len].to_string() });
            } else if rest.starts_with("//") {
                let len = rest.find('\n').unwrap_or(rest.len());
                self.pos += len;
                pieces.push(TriviaPiece { kind: TriviaKind::LineComment, text: rest[..len].to_string() });
            } else if rest.starts_with("/*") {
                let len = rest.find("*/").map(|i| i + 2).unwrap_or(rest.len());
                self.pos += len;
                pieces.push(TriviaPiece { kind: TriviaKind::BlockComment, text: rest[..len].to_string() });
            } else {
                break;
            }
        }
        pieces
    }

    fn scan_raw(&mut self) -> (TokenKind, &'a str) {
        let start = self.pos;
        let rest = self.rest();
        if rest.is_empty() {
            return (TokenKind::Eof, "");
        }

        const MULTI_CHAR: &[(&str, TokenKind)] = &[
            ("...", TokenKind::Ellipsis),
            ("::", TokenKind::ColonColon),
            ("->", TokenKind::Arrow),
            ("=>", TokenKind::FatArrow),
            ("==", TokenKind::EqEq),
            ("!=", TokenKind::NotEq),
            ("<=", TokenKind::LtEq),
            (">=", TokenKind::GtEq),
            ("<<", TokenKind::Shl),
            (">>", TokenKind::Shr),
            ("&&", TokenKind::AmpAmp),
            ("||", TokenKind::PipePipe),
            ("+=", TokenKind::PlusEq),
            ("-=", TokenKind::MinusEq),
            ("*=", TokenKind::StarEq),
            ("/=", TokenKind::SlashEq),
            ("%=", TokenKind::PercentEq),
            ("&=", TokenKind::AmpEq),
        ];
        for (spelling, kind) in MULTI_CHAR {
            if rest.starts_with(spelling) {
                self.pos += spelling.len();
                return (*kind, &self.text[start..self.pos]);
            }
        }

        const SINGLE_CHAR: &[(char, TokenKind)] = &[
            ('(', TokenKind::LParen),
            (')', TokenKind::RParen),
            ('{', TokenKind::LBrace),
            ('}', TokenKind::RBrace),
            ('[', TokenKind::LBracket),
            (']', TokenKind::RBracket),
            (';', TokenKind::Semicolon),
            (':', TokenKind::Colon),
            (',', TokenKind::Comma),
            ('.', TokenKind::Dot),
            ('=', TokenKind::Eq),
            ('<', TokenKind::Lt),
            ('>', TokenKind::Gt),
            ('+', TokenKind::Plus),
            ('-', TokenKind::Minus),
            ('*', TokenKind::Star),
            ('/', TokenKind::Slash),
            ('%', TokenKind::Percent),
            ('&', TokenKind::Amp),
            ('|', TokenKind::Pipe),
            ('^', TokenKind::Caret),
            ('~', TokenKind::Tilde),
            ('!', TokenKind::Bang),
        ];
        let Some(first) = rest.chars().next() else { unreachable!("checked non-empty above") };
        for (spelling, kind) in SINGLE_CHAR {
            if first == *spelling {
                self.pos += first.len_utf8();
                return (*kind, &self.text[start..self.pos]);
            }
        }

        if first == 'r' && rest.as_bytes().get(1) == Some(&b'"') {
            let len = 1 + scan_delimited(&rest[1..], '"');
            self.pos += len;
            return (TokenKind::RawStringLiteral, &self.text[start..self.pos]);
        }

        if first == '_' || first.is_alphabetic() {
            let len = rest
                .char_indices()
                .take_while(|(_, c)| *c == '_' || c.is_alphanumeric())
                .last()
                .map(|(i, c)| i + c.len_utf8())
                .unwrap_or(0);
            self.pos += len;
            let text = &self.text[start..self.pos];
            let kind = TokenKind::keyword_from_str(text).unwrap_or(TokenKind::Identifier);
            return (kind, text);
        }

        if first == '0' && matches!(rest.as_bytes().get(1), Some(b'x' | b'X')) {
            let len = 2 + rest[2..].bytes().take_while(u8::is_ascii_hexdigit).count();
            self.pos += len;
            return (TokenKind::IntegerLiteral, &self.text[start..self.pos]);
        }
        if first == '0' && matches!(rest.as_bytes().get(1), Some(b'b' | b'B')) {
            let len = 2 + rest[2..].bytes().take_while(|b| *b == b'0' || *b == b'1').count();
            self.pos += len;
            return (TokenKind::IntegerLiteral, &self.text[start..self.pos]);
        }
        if first == '0' && matches!(rest.as_bytes().get(1), Some(b'o' | b'O')) {
            let len = 2 + rest[2..].bytes().take_while(|b| (b'0'..=b'7').contains(b)).count();
            self.pos += len;
            return (TokenKind::IntegerLiteral, &self.text[start..self.pos]);
        }

        if first.is_ascii_digit() {
            let mut len = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
            let mut kind = TokenKind::IntegerLiteral;
            if rest.as_bytes().get(len) == Some(&b'.') && rest.as_bytes().get(len + 1).is_some_and(u8::is_ascii_digit) {
                kind = TokenKind::FloatLiteral;
                len += 1;
                len += rest[len..].bytes().take_while(|b| b.is_ascii_digit()).count();
            }
            self.pos += len;
            return (kind, &self.text[start..self.pos]);
        }

        if first == '"' {
            let len = scan_delimited(rest, '"');
            self.pos += len;
            return (TokenKind::StringLiteral, &self.text[start..self.pos]);
        }

        if first == '\'' {
            let len = scan_delimited(rest, '\'');
            self.pos += len;
            return (TokenKind::CharLiteral, &self.text[start..self.pos]);
        }

        // No production matches: consume exactly one character so the
        // lexer always makes progress, and hand the parser an `Unknown`
        // token it can fold into an error node.
        self.pos += first.len_utf8();
        (TokenKind::Unknown, &self.text[start..self.pos])
    }
}

/// Scans a quoted literal starting at `rest[0] == delim`, consuming up to
/// and including the matching unescaped closing quote, or to end of input
/// if none is found.
fn scan_delimited(rest: &str, delim: char) -> usize {
    let mut chars = rest.char_indices();
    chars.next(); // opening delimiter
    let mut escaped = false;
    for (i, c) in chars {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
            continue;
        }
        if c == delim {
            return i + c.len_utf8();
        }
    }
    rest.len()
}

fn split_trailing(trivia: Vec<TriviaPiece>) -> (Vec<TriviaPiece>, Vec<TriviaPiece>) {
    match trivia.iter().position(|p| p.kind == TriviaKind::Newline) {
        Some(idx) => {
            let mut trailing = trivia;
            let remainder = trailing.split_off(idx + 1);
            (trailing, remainder)
        }
        None => (trivia, Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(text: &str) -> Vec<TokenKind> {
        let cache = Rc::new(ElementCache::new());
        let mut lexer = Lexer::new(text, cache);
        let mut kinds = Vec::new();
        loop {
            let record = lexer.peek();
            kinds.push(record.kind);
            lexer.advance();
            if record.kind == TokenKind::Eof {
                break;
            }
        }
        kinds
    }

    #[test]
    fn keyword_takes_precedence_over_identifier() {
        assert_eq!(lex_all("if"), vec![TokenKind::KwIf, TokenKind::Eof]);
    }

    #[test]
    fn builtin_type_name_is_an_identifier() {
        assert_eq!(lex_all("int"), vec![TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn multi_char_operator_wins_over_prefix() {
        assert_eq!(lex_all("=="), vec![TokenKind::EqEq, TokenKind::Eof]);
        assert_eq!(lex_all("="), vec![TokenKind::Eq, TokenKind::Eof]);
        assert_eq!(lex_all("::"), vec![TokenKind::ColonColon, TokenKind::Eof]);
    }

    #[test]
    fn unknown_byte_does_not_stall_the_lexer() {
        assert_eq!(lex_all("a@b"), vec![TokenKind::Identifier, TokenKind::Unknown, TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn trivia_splits_trailing_from_next_leading() {
        let cache = Rc::new(ElementCache::new());
        let mut lexer = Lexer::new("a // trailing\n// leading\nb", cache);
        let first = lexer.advance();
        assert_eq!(first.trailing.len(), 2); // whitespace + line comment, stops before newline consumption by design
        let second_leading_len = lexer.peek();
        assert_eq!(second_leading_len.kind, TokenKind::Identifier);
    }

    #[test]
    fn float_literal_requires_digit_after_dot() {
        assert_eq!(lex_all("1.5"), vec![TokenKind::FloatLiteral, TokenKind::Eof]);
        assert_eq!(lex_all("1."), vec![TokenKind::IntegerLiteral, TokenKind::Dot, TokenKind::Eof]);
    }

    #[test]
    fn string_literal_handles_escaped_quote() {
        assert_eq!(lex_all(r#""a\"b""#), vec![TokenKind::StringLiteral, TokenKind::Eof]);
    }

    #[test]
    fn radix_prefixed_integers_are_recognized() {
        assert_eq!(lex_all("0x1F"), vec![TokenKind::IntegerLiteral, TokenKind::Eof]);
        assert_eq!(lex_all("0b101"), vec![TokenKind::IntegerLiteral, TokenKind::Eof]);
        assert_eq!(lex_all("0o17"), vec![TokenKind::IntegerLiteral, TokenKind::Eof]);
    }

    #[test]
    fn raw_string_does_not_process_escapes() {
        assert_eq!(lex_all(r#"r"a\b""#), vec![TokenKind::RawStringLiteral, TokenKind::Eof]);
    }

    #[test]
    fn a_bare_r_identifier_still_lexes_as_an_identifier() {
        assert_eq!(lex_all("r"), vec![TokenKind::Identifier, TokenKind::Eof]);
        assert_eq!(lex_all("raw"), vec![TokenKind::Identifier, TokenKind::Eof]);
    }
}
