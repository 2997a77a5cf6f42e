//! A per-process workspace of open documents, wiring the incremental
//! reparse driver to the symbol-table query over a demand-driven engine.
//!
//! Each document lives in its own [`charon_incremental::Document`], with its
//! own element cache and text buffer; nothing here shares mutable state
//! across documents. The only state this crate adds on top is the
//! file-id <-> uri mapping [`SymtabQuery`] needs as a key, and the one
//! [`SymbolStore`] symbols from every open document are interned into.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use charon_diagnostics::DiagnosticList;
use charon_incremental::{Document, TextEdit};
use charon_position::Position;
use charon_query::QueryEngine;
use charon_symbols::{FileId, SymbolStore, SymtabContext, SymtabQuery};
use charon_tree::Red;

/// The diagnostics to surface for one document, produced after `Open` and
/// after every `Change`.
#[derive(Debug, Clone)]
pub struct PublishDiagnostics {
    pub uri: String,
    pub diagnostics: DiagnosticList,
}

#[derive(Default)]
struct WorkspaceContext {
    documents: RefCell<HashMap<FileId, Document>>,
    uri_to_file: RefCell<HashMap<String, FileId>>,
    next_id: Cell<u32>,
    store: SymbolStore,
}

impl WorkspaceContext {
    fn intern_uri(&self, uri: &str) -> FileId {
        if let Some(&file) = self.uri_to_file.borrow().get(uri) {
            return file;
        }
        let file = FileId(self.next_id.get());
        self.next_id.set(file.0 + 1);
        self.uri_to_file.borrow_mut().insert(uri.to_string(), file);
        file
    }

    fn file_for(&self, uri: &str) -> Option<FileId> {
        self.uri_to_file.borrow().get(uri).copied()
    }
}

impl SymtabContext for WorkspaceContext {
    fn red_root(&self, file: FileId) -> Option<Rc<Red>> {
        Some(self.documents.borrow().get(&file)?.red_root())
    }

    fn symbol_store(&self) -> &SymbolStore {
        &self.store
    }
}

/// A collection of open documents, addressed by URI.
pub struct Workspace {
    engine: QueryEngine<WorkspaceContext>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self { engine: QueryEngine::new(WorkspaceContext::default()) }
    }

    /// *Open(uri, text)*: parses `text` as a new document and publishes its
    /// diagnostics. If `uri` was already open, the prior document's symtab
    /// is released once the new one has been published in its place.
    pub fn open(&self, uri: &str, text: &str) -> PublishDiagnostics {
        let file = self.engine.context().intern_uri(uri);
        let had_document = self.engine.context().documents.borrow().contains_key(&file);
        let previous_table = had_document.then(|| self.engine.execute::<SymtabQuery>(file).table);
        self.engine.context().documents.borrow_mut().insert(file, Document::open(text));
        self.engine.invalidate::<SymtabQuery>(&file);
        let report = self.publish(uri, file);
        if let Some(table) = previous_table {
            self.engine.context().store.unref_table(table);
        }
        report
    }

    /// *Change(uri, edits[])*: applies `edits` to an already-open document
    /// in sequence and republishes its diagnostics. A malformed edit
    /// position is logged and skipped rather than aborting the rest. The
    /// edited document's previous symtab is released once its replacement
    /// has been published, so repeated edits don't accumulate superseded
    /// symbol tables in the store.
    ///
    /// Panics if `uri` has never been opened: that is a protocol violation
    /// by the caller, not a malformed document.
    pub fn change(&self, uri: &str, edits: Vec<TextEdit>) -> PublishDiagnostics {
        let file = self.engine.context().file_for(uri).unwrap_or_else(|| panic!("change on unopened document {uri}"));
        let previous_table = self.engine.execute::<SymtabQuery>(file).table;
        {
            let mut documents = self.engine.context().documents.borrow_mut();
            let document = documents.get_mut(&file).unwrap_or_else(|| panic!("change on unopened document {uri}"));
            for edit in edits {
                if let Err(error) = document.apply_edit(edit) {
                    tracing::warn!(%uri, %error, "dropped an edit with an out-of-range position");
                }
            }
        }
        self.engine.invalidate::<SymtabQuery>(&file);
        let report = self.publish(uri, file);
        self.engine.context().store.unref_table(previous_table);
        report
    }

    /// *Hover(uri, position)*: the printable kind name of the token or node
    /// under `position`, or `None` if the document isn't open or the
    /// position doesn't land in it.
    pub fn hover(&self, uri: &str, position: Position) -> Option<String> {
        let file = self.engine.context().file_for(uri)?;
        self.engine.context().documents.borrow().get(&file)?.hover(position)
    }

    /// The symbol table computed for `uri`'s current tree, or `None` if it
    /// isn't open. Recomputed on demand; cached until the next `change`.
    pub fn symbol_table(&self, uri: &str) -> Option<charon_symbols::SymbolTable> {
        let file = self.engine.context().file_for(uri)?;
        let result = self.engine.execute::<SymtabQuery>(file);
        self.engine.context().store.table(result.table)
    }

    pub fn symbols(&self) -> &SymbolStore {
        &self.engine.context().store
    }

    fn publish(&self, uri: &str, file: FileId) -> PublishDiagnostics {
        let mut diagnostics = self
            .engine
            .context()
            .documents
            .borrow()
            .get(&file)
            .map(|d| d.diagnostics().clone())
            .unwrap_or_default();
        let symtab = self.engine.execute::<SymtabQuery>(file);
        diagnostics.extend(symtab.diagnostics);
        PublishDiagnostics { uri: uri.to_string(), diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_a_well_formed_function_yields_no_diagnostics_and_one_symbol() {
        let ws = Workspace::new();
        let report = ws.open("file:///f.cn", "function f() : int {}\n");
        assert!(report.diagnostics.is_empty());
        let table = ws.symbol_table("file:///f.cn").unwrap();
        assert_eq!(table.symbols.len(), 1);
        let symbol = ws.symbols().symbol(table.symbols[0]).unwrap();
        assert_eq!(&*symbol.name, "f");
    }

    #[test]
    fn change_reruns_symbol_table_for_the_edited_document() {
        let ws = Workspace::new();
        ws.open("file:///f.cn", "function f() : int {}\n");
        let report = ws.change(
            "file:///f.cn",
            vec![TextEdit { start: Position::new(0, 9), end: Position::new(0, 10), text: "g".to_string() }],
        );
        assert!(report.diagnostics.is_empty());
        let table = ws.symbol_table("file:///f.cn").unwrap();
        let symbol = ws.symbols().symbol(table.symbols[0]).unwrap();
        assert_eq!(&*symbol.name, "g");
    }

    #[test]
    fn hover_reports_none_for_an_unopened_document() {
        let ws = Workspace::new();
        assert!(ws.hover("file:///missing.cn", Position::new(0, 0)).is_none());
    }

    #[test]
    fn repeated_edits_release_the_superseded_symbol_table() {
        let ws = Workspace::new();
        ws.open("file:///f.cn", "function f() : int {}\n");
        let first_table = ws.symbol_table("file:///f.cn").unwrap();
        let first_symbol_key = first_table.symbols[0];

        ws.change(
            "file:///f.cn",
            vec![TextEdit { start: Position::new(0, 9), end: Position::new(0, 10), text: "g".to_string() }],
        );

        // the old document's table and symbol are gone, not merely stale.
        assert!(ws.symbols().symbol(first_symbol_key).is_none());
        let second_table = ws.symbol_table("file:///f.cn").unwrap();
        assert_eq!(second_table.symbols.len(), 1);
    }
}
