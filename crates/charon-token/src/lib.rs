//! Token and trivia kind sets shared by the lexer, parser, and syntax tree.
//!
//! These enums are the leaves of the grammar: every [`TokenKind`] can appear
//! as a token in the green tree, and every [`TriviaKind`] can appear attached
//! to a token's leading or trailing trivia list. Neither enum depends on the
//! tree representation itself, so both can be reused by tooling that only
//! needs to talk about lexical categories (e.g. a standalone formatter).

use std::fmt;

/// The lexical category of a single token.
///
/// Charon keeps its keyword set intentionally small: built-in type spellings
/// such as `int`, `bool`, `ptr`, or `u32` are lexed as plain [`TokenKind::Identifier`]
/// tokens and classified later by the pass that needs to tell a type name
/// from a variable name. Only words that change how the parser recurses are
/// true keywords here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[non_exhaustive]
pub enum TokenKind {
    // --- Literals ---
    /// A run of ASCII/Unicode digits, optionally with a radix prefix or
    /// a fractional/exponent suffix. Radix and suffix validation happens
    /// when the literal is consumed, not during lexing.
    IntegerLiteral,
    /// A floating-point literal, e.g. `3.14`, `1.0e-9`.
    FloatLiteral,
    /// A double-quoted string literal, including its delimiting quotes.
    StringLiteral,
    /// A raw string literal, `r"..."`: no escape processing inside its
    /// body, including its leading `r` and both quotes.
    RawStringLiteral,
    /// A single-quoted character literal, including its delimiting quotes.
    CharLiteral,

    // --- Identifiers ---
    /// Any identifier, including the soft-keyword type spellings.
    Identifier,

    // --- Keywords ---
    /// `type`
    KwType,
    /// `module`
    KwModule,
    /// `let`
    KwLet,
    /// `function`
    KwFunction,
    /// `struct`
    KwStruct,
    /// `extern`
    KwExtern,
    /// `enum`
    KwEnum,
    /// `if`
    KwIf,
    /// `else`
    KwElse,
    /// `while`
    KwWhile,
    /// `for`
    KwFor,
    /// `switch`
    KwSwitch,
    /// `default`
    KwDefault,
    /// `return`
    KwReturn,
    /// `continue`
    KwContinue,
    /// `break`
    KwBreak,
    /// `as` (cast operator)
    KwAs,
    /// `sizeof`
    KwSizeof,
    /// `true`
    KwTrue,
    /// `false`
    KwFalse,

    // --- Punctuation ---
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `::`
    ColonColon,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `->`
    Arrow,
    /// `=>`
    FatArrow,
    /// `...`
    Ellipsis,

    // --- Operators ---
    /// `=`
    Eq,
    /// `+=`
    PlusEq,
    /// `-=`
    MinusEq,
    /// `*=`
    StarEq,
    /// `/=`
    SlashEq,
    /// `%=`
    PercentEq,
    /// `&=`
    AmpEq,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `&`
    Amp,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `~`
    Tilde,
    /// `!`
    Bang,
    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,

    /// End of input. Emitted exactly once, as the final token of every file.
    Eof,
    /// A run of input bytes the lexer could not classify as anything else.
    /// The parser treats this the same as any other unexpected token: it
    /// is recorded as a diagnostic and wrapped in an error node.
    Unknown,
}

impl TokenKind {
    /// Whether this kind can only ever be produced as a keyword, i.e. its
    /// spelling is reserved and cannot also name a variable or type.
    pub const fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::KwType
                | TokenKind::KwModule
                | TokenKind::KwLet
                | TokenKind::KwFunction
                | TokenKind::KwStruct
                | TokenKind::KwExtern
                | TokenKind::KwEnum
                | TokenKind::KwIf
                | TokenKind::KwElse
                | TokenKind::KwWhile
                | TokenKind::KwFor
                | TokenKind::KwSwitch
                | TokenKind::KwDefault
                | TokenKind::KwReturn
                | TokenKind::KwContinue
                | TokenKind::KwBreak
                | TokenKind::KwAs
                | TokenKind::KwSizeof
                | TokenKind::KwTrue
                | TokenKind::KwFalse
        )
    }

    /// The keyword this exact text spells, if any.
    ///
    /// Deliberately excludes the built-in type spellings (`bool`, `char`,
    /// `ptr`, `vaddr`, `size`, `paddr`, `uint`, `int`, and sized integer
    /// names like `u32`/`i64`): those remain [`TokenKind::Identifier`] and
    /// are classified by whatever pass consumes them.
    pub fn keyword_from_str(text: &str) -> Option<TokenKind> {
        Some(match text {
            "type" => TokenKind::KwType,
            "module" => TokenKind::KwModule,
            "let" => TokenKind::KwLet,
            "function" => TokenKind::KwFunction,
            "struct" => TokenKind::KwStruct,
            "extern" => TokenKind::KwExtern,
            "enum" => TokenKind::KwEnum,
            "if" => TokenKind::KwIf,
            "else" => TokenKind::KwElse,
            "while" => TokenKind::KwWhile,
            "for" => TokenKind::KwFor,
            "switch" => TokenKind::KwSwitch,
            "default" => TokenKind::KwDefault,
            "return" => TokenKind::KwReturn,
            "continue" => TokenKind::KwContinue,
            "break" => TokenKind::KwBreak,
            "as" => TokenKind::KwAs,
            "sizeof" => TokenKind::KwSizeof,
            "true" => TokenKind::KwTrue,
            "false" => TokenKind::KwFalse,
            _ => return None,
        })
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The kind of a piece of trivia (non-semantic text) attached to a token.
///
/// Trivia never appears as a standalone element in the tree; it is always
/// held in the leading or trailing trivia list of the [`TokenKind`] it is
/// adjacent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TriviaKind {
    /// Spaces and tabs.
    Whitespace,
    /// A line terminator (`\n`, or `\r\n` treated as one unit).
    Newline,
    /// A `// ...` comment, not including the terminating newline.
    LineComment,
    /// A `/* ... */` comment, including both delimiters.
    BlockComment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_type_spellings_are_not_keywords() {
        for text in [
            "bool", "char", "ptr", "vaddr", "size", "paddr", "uint", "int", "u8", "u16", "u32",
            "u64", "i8", "i16", "i32", "i64",
        ] {
            assert_eq!(TokenKind::keyword_from_str(text), None, "{text} must lex as an identifier");
        }
    }

    #[test]
    fn control_flow_words_are_keywords() {
        assert_eq!(TokenKind::keyword_from_str("if"), Some(TokenKind::KwIf));
        assert!(TokenKind::KwIf.is_keyword());
        assert!(!TokenKind::Identifier.is_keyword());
    }
}
