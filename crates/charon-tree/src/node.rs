use std::fmt;

/// The grammar production a [`crate::GreenNode`] was built by.
///
/// `Error` nodes are produced by the parser's recovery path rather than by
/// any single grammar rule; they may wrap zero or more tokens consumed while
/// resynchronizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum NodeKind {
    /// The whole file: a flat sequence of top-level constructs.
    Root,

    // --- Top-level constructs ---
    TlcTypeDefinition,
    TlcModule,
    TlcFunction,
    TlcExtern,
    TlcDeclaration,
    TlcEnum,

    // --- Types ---
    TypeStruct,
    TypeTuple,
    TypeArray,
    TypePointer,
    TypeFunctionSignature,
    /// A named type reference, optionally module-qualified and/or
    /// carrying `^...^`-delimited generic arguments.
    TypeReference,

    // --- Statements ---
    /// Every statement is wrapped in one of these regardless of its inner
    /// kind, mirroring the grammar's own uniform `stmt` production.
    Stmt,
    StmtEmpty,
    StmtExpression,
    StmtDeclaration,
    StmtReturn,
    StmtIf,
    StmtWhile,
    StmtFor,
    StmtSwitch,
    StmtSwitchCase,
    StmtBlock,
    StmtContinue,
    StmtBreak,

    // --- Expressions ---
    ExprAssignment,
    /// Any binary operation: logical, bitwise, equality, relational,
    /// shift, additive, or multiplicative. The operator token child
    /// distinguishes which.
    ExprBinary,
    ExprUnary,
    ExprCast,
    ExprSubscript,
    ExprSubscriptDeref,
    ExprCall,
    /// A `::`-separated path. Left ambiguous on purpose: whether each
    /// segment denotes a module or a type is not decided at parse time.
    ExprSelector,
    ExprVariable,
    ExprLiteralStruct,
    ExprLiteralNumeric,
    ExprLiteralString,
    ExprLiteralChar,
    ExprLiteralBool,
    ExprParenthesized,
    ExprTuple,
    ExprSizeof,

    /// A span of input the parser could not fit into any production. May
    /// be empty (zero consumed tokens) when recovery found the next token
    /// already belongs to an enclosing construct.
    Error,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
