//! The symbol-table query: a demand-computed, per-file index of the names
//! a file declares, built by walking its syntax tree via red facades.
//!
//! Modules nest: a `module` node materializes a symbol with its own
//! [`SymbolTable`], and everything declared inside it lands in that
//! nested table rather than the file's own. Everything else this query
//! recognizes (functions, externs, declarations, enums) materializes a
//! flat symbol carrying its [`Path`] back to its defining node. Symbols
//! and tables both live in the generic interner, so other queries can
//! hold a cheap [`Key`] to one instead of a deep clone.

use std::cell::RefCell;
use std::rc::Rc;

use charon_diagnostics::{Diagnostic, DiagnosticKind, DiagnosticList, Path};
use charon_interner::{Interner, Key};
use charon_position::Span;
use charon_query::{Query, QueryEngine};
use charon_token::TokenKind;
use charon_tree::{GreenElement, Kind, NodeKind, Red};

/// Identifies a source file within a query context. Opaque on purpose:
/// only the context that hands these out needs to know how they map to
/// an actual document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Module,
    Function,
    Extern,
    Declaration,
    Enum,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: Box<str>,
    pub kind: SymbolKind,
    /// Where this symbol's defining node lives in its file's tree.
    pub definition: Path,
    /// The symbol's own nested table, for [`SymbolKind::Module`] only.
    pub nested_table: Option<Key>,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    pub symbols: Vec<Key>,
}

/// Backing storage for every [`Symbol`] and [`SymbolTable`] a query
/// context has produced. Kept separate from the query engine's own
/// cache: a symbol table's [`Key`] is cheap to clone and stays valid
/// across query invalidation, even though the engine may recompute
/// which keys a given file's table actually holds.
#[derive(Default)]
pub struct SymbolStore {
    symbols: RefCell<Interner<Symbol>>,
    tables: RefCell<Interner<SymbolTable>>,
}

impl SymbolStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_symbol(&self, symbol: Symbol) -> Key {
        self.symbols.borrow_mut().insert(symbol)
    }

    pub fn insert_table(&self, table: SymbolTable) -> Key {
        self.tables.borrow_mut().insert(table)
    }

    pub fn symbol(&self, key: Key) -> Option<Symbol> {
        self.symbols.borrow().get(key).cloned()
    }

    pub fn table(&self, key: Key) -> Option<SymbolTable> {
        self.tables.borrow().get(key).cloned()
    }

    /// Releases the caller's reference to `key`'s table. If that was the
    /// last reference, the table's own symbols (and, transitively, their
    /// nested tables) are released in turn, so a whole superseded symtab
    /// is freed in one call instead of leaking until the store itself is
    /// dropped.
    pub fn unref_table(&self, key: Key) {
        let freed = {
            let mut tables = self.tables.borrow_mut();
            // must read the table's symbol list before unref: a freeing
            // unref clears the slot, so the list has to be in hand first.
            let symbols = tables.get(key).map(|t| t.symbols.clone());
            let freed = tables.unref(key);
            (freed, symbols)
        };
        if let (true, Some(symbols)) = freed {
            for symbol_key in symbols {
                self.unref_symbol(symbol_key);
            }
        }
    }

    /// Releases the caller's reference to `key`'s symbol, and its nested
    /// table in turn if this was the last reference and the symbol is a
    /// module carrying one.
    pub fn unref_symbol(&self, key: Key) {
        let freed = {
            let mut symbols = self.symbols.borrow_mut();
            let nested_table = symbols.get(key).and_then(|s| s.nested_table);
            let freed = symbols.unref(key);
            (freed, nested_table)
        };
        if let (true, Some(nested)) = freed {
            self.unref_table(nested);
        }
    }
}

/// What a query context must provide for [`SymtabQuery`] to run.
pub trait SymtabContext {
    /// The root of `file`'s current syntax tree, or `None` if `file`
    /// doesn't name an open document.
    fn red_root(&self, file: FileId) -> Option<Rc<Red>>;
    fn symbol_store(&self) -> &SymbolStore;
}

#[derive(Debug, Clone)]
pub struct SymtabResult {
    pub table: Key,
    pub diagnostics: DiagnosticList,
}

pub struct SymtabQuery;

impl<C: SymtabContext + 'static> Query<C> for SymtabQuery {
    type Key = FileId;
    type Value = SymtabResult;
    const NAME: &'static str = "symtab";

    fn compute(engine: &QueryEngine<C>, key: &FileId) -> SymtabResult {
        let ctx = engine.context();
        let store = ctx.symbol_store();
        let mut diagnostics = DiagnosticList::new();
        let mut symbols = Vec::new();

        if let Some(root) = ctx.red_root(*key) {
            collect_from(&root, store, &mut diagnostics, &Path::root(), &mut symbols);
        }

        let table = store.insert_table(SymbolTable { symbols });
        SymtabResult { table, diagnostics }
    }
}

/// Returns `(symbol kind, index of the identifier child naming it)` for
/// the top-level construct kinds this query turns into a [`Symbol`].
/// `TlcTypeDefinition` is deliberately excluded: type names are resolved
/// elsewhere, not carried in the symbol table.
fn tlc_symbol_info(kind: NodeKind) -> Option<(SymbolKind, usize)> {
    Some(match kind {
        NodeKind::TlcFunction => (SymbolKind::Function, 1),
        NodeKind::TlcExtern => (SymbolKind::Extern, 2),
        NodeKind::TlcDeclaration => (SymbolKind::Declaration, 0),
        NodeKind::TlcEnum => (SymbolKind::Enum, 1),
        _ => return None,
    })
}

fn collect_from(element: &Rc<Red>, store: &SymbolStore, diagnostics: &mut DiagnosticList, path: &Path, out: &mut Vec<Key>) {
    let node_kind = match element.kind() {
        Kind::Token(_) => return,
        Kind::Node(kind) => kind,
    };

    if node_kind == NodeKind::TlcModule {
        match identifier_text(element, 1) {
            Some(name) => {
                let mut nested = Vec::new();
                for (index, child) in element.children().iter().enumerate() {
                    collect_from(child, store, diagnostics, &path.child(index as u32), &mut nested);
                }
                let table_key = store.insert_table(SymbolTable { symbols: nested });
                let symbol = Symbol { name, kind: SymbolKind::Module, definition: path.clone(), nested_table: Some(table_key) };
                out.push(store.insert_symbol(symbol));
            }
            None => {
                diagnostics.push(missing_name_diagnostic(element, path));
                for (index, child) in element.children().iter().enumerate() {
                    collect_from(child, store, diagnostics, &path.child(index as u32), out);
                }
            }
        }
        return;
    }

    if let Some((kind, name_index)) = tlc_symbol_info(node_kind) {
        match identifier_text(element, name_index) {
            Some(name) => out.push(store.insert_symbol(Symbol { name, kind, definition: path.clone(), nested_table: None })),
            None => diagnostics.push(missing_name_diagnostic(element, path)),
        }
    }

    for (index, child) in element.children().iter().enumerate() {
        collect_from(child, store, diagnostics, &path.child(index as u32), out);
    }
}

fn identifier_text(element: &Rc<Red>, index: usize) -> Option<Box<str>> {
    let child = element.child(index)?;
    match child.green() {
        GreenElement::Token(token) if token.kind == TokenKind::Identifier => Some(token.text.clone()),
        _ => None,
    }
}

fn missing_name_diagnostic(element: &Red, path: &Path) -> Diagnostic {
    let span = Span { start: element.offset(), end: element.end() };
    Diagnostic::new(path.clone(), span, DiagnosticKind::StructuralError { message: "expected an identifier naming this declaration".to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use charon_tree::ElementCache;

    struct TestContext {
        root: Rc<Red>,
        store: SymbolStore,
    }

    impl SymtabContext for TestContext {
        fn red_root(&self, _file: FileId) -> Option<Rc<Red>> {
            Some(Rc::clone(&self.root))
        }

        fn symbol_store(&self) -> &SymbolStore {
            &self.store
        }
    }

    fn ident(cache: &ElementCache, text: &str) -> GreenElement {
        GreenElement::Token(cache.make_token(TokenKind::Identifier, text, vec![], vec![]))
    }

    fn kw(cache: &ElementCache, kind: TokenKind, text: &str) -> GreenElement {
        GreenElement::Token(cache.make_token(kind, text, vec![], vec![]))
    }

    #[test]
    fn module_nests_its_declarations_in_their_own_table() {
        let cache = ElementCache::new();
        let decl = cache.make_node(
            NodeKind::TlcDeclaration,
            vec![ident(&cache, "inner"), kw(&cache, TokenKind::Colon, ":"), ident(&cache, "int"), kw(&cache, TokenKind::Semicolon, ";")],
        );
        let module = cache.make_node(
            NodeKind::TlcModule,
            vec![
                kw(&cache, TokenKind::KwModule, "module"),
                ident(&cache, "m"),
                kw(&cache, TokenKind::LBrace, "{"),
                GreenElement::Node(decl),
                kw(&cache, TokenKind::RBrace, "}"),
            ],
        );
        let outer_decl = cache.make_node(
            NodeKind::TlcDeclaration,
            vec![ident(&cache, "outer"), kw(&cache, TokenKind::Colon, ":"), ident(&cache, "int"), kw(&cache, TokenKind::Semicolon, ";")],
        );
        let root_node = cache.make_node(NodeKind::Root, vec![GreenElement::Node(module), GreenElement::Node(outer_decl)]);
        let root = Red::wrap_root(GreenElement::Node(root_node));

        let ctx = TestContext { root, store: SymbolStore::new() };
        let engine = QueryEngine::new(ctx);
        let result = engine.execute::<SymtabQuery>(FileId(0));
        assert!(result.diagnostics.is_empty());

        let store = engine.context().symbol_store();
        let top_table = store.table(result.table).unwrap();
        assert_eq!(top_table.symbols.len(), 2);

        let module_symbol = store.symbol(top_table.symbols[0]).unwrap();
        assert_eq!(&*module_symbol.name, "m");
        assert_eq!(module_symbol.kind, SymbolKind::Module);
        let nested_table = store.table(module_symbol.nested_table.unwrap()).unwrap();
        assert_eq!(nested_table.symbols.len(), 1);
        let nested_symbol = store.symbol(nested_table.symbols[0]).unwrap();
        assert_eq!(&*nested_symbol.name, "inner");

        let outer_symbol = store.symbol(top_table.symbols[1]).unwrap();
        assert_eq!(&*outer_symbol.name, "outer");
        assert_eq!(outer_symbol.definition.steps(), &[1]);
    }

    #[test]
    fn malformed_module_records_a_diagnostic_instead_of_a_symbol() {
        let cache = ElementCache::new();
        let module = cache.make_node(
            NodeKind::TlcModule,
            vec![kw(&cache, TokenKind::KwModule, "module"), kw(&cache, TokenKind::LBrace, "{"), kw(&cache, TokenKind::RBrace, "}")],
        );
        let root_node = cache.make_node(NodeKind::Root, vec![GreenElement::Node(module)]);
        let root = Red::wrap_root(GreenElement::Node(root_node));

        let ctx = TestContext { root, store: SymbolStore::new() };
        let engine = QueryEngine::new(ctx);
        let result = engine.execute::<SymtabQuery>(FileId(0));
        assert_eq!(result.diagnostics.len(), 1);
        let table = engine.context().symbol_store().table(result.table).unwrap();
        assert!(table.symbols.is_empty());
    }
}
