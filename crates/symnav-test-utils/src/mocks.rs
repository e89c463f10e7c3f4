//! Mock implementations for testing.
//!
//! In-memory stand-ins for the symbol collaborators. They keep their data
//! behind `Arc<Mutex<..>>` so a clone handed to the operations can still be
//! inspected by the test.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use symnav_symbols::{
    assign_overload_indices, path_in_scope, CodeEditor, KindFilter, LspSession, NamePathPattern,
    Project, RawLocation, ReferenceInSymbol, Snippet, Symbol, SymbolError, SymbolQuery,
    SymbolResult, SymbolRetriever,
};

fn resolve_in(
    files: &BTreeMap<String, Vec<Symbol>>,
    name_path: &NamePathPattern,
    relative_path: &str,
) -> SymbolResult<Symbol> {
    let symbols = files.get(relative_path).ok_or_else(|| {
        SymbolError::not_found(format!("File {relative_path} does not exist in the project."))
    })?;
    SymbolQuery::new(name_path.clone())
        .select(symbols)
        .into_iter()
        .next()
        .cloned()
        .ok_or_else(|| {
            SymbolError::not_found(format!(
                "No symbol with name path '{name_path}' found in file {relative_path}"
            ))
        })
}

/// A symbol retriever over a fixed set of per-file symbol trees.
#[derive(Clone, Default)]
pub struct MockSymbolRetriever {
    files: Arc<Mutex<BTreeMap<String, Vec<Symbol>>>>,
    references: Arc<Mutex<Vec<ReferenceInSymbol>>>,
    queries: Arc<Mutex<Vec<SymbolQuery>>>,
}

impl MockSymbolRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the top-level symbols of a file. Overload indices are assigned.
    pub fn with_file(self, relative_path: &str, mut symbols: Vec<Symbol>) -> Self {
        assign_overload_indices(&mut symbols);
        self.files
            .lock()
            .unwrap()
            .insert(relative_path.to_string(), symbols);
        self
    }

    /// References returned for any resolvable target.
    pub fn with_references(self, references: Vec<ReferenceInSymbol>) -> Self {
        self.references.lock().unwrap().extend(references);
        self
    }

    /// Queries received by `find_by_name`.
    pub fn queries(&self) -> Vec<SymbolQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SymbolRetriever for MockSymbolRetriever {
    async fn get_overview(&self, relative_path: &str) -> SymbolResult<BTreeMap<String, Vec<Symbol>>> {
        let files = self.files.lock().unwrap();
        Ok(files
            .iter()
            .filter(|(path, _)| path_in_scope(path, relative_path))
            .map(|(path, symbols)| (path.clone(), symbols.clone()))
            .collect())
    }

    async fn find_by_name(&self, query: &SymbolQuery) -> SymbolResult<Vec<Symbol>> {
        self.queries.lock().unwrap().push(query.clone());
        let files = self.files.lock().unwrap();
        Ok(files
            .iter()
            .filter(|(path, _)| query.in_scope(path))
            .flat_map(|(_, symbols)| query.select(symbols).into_iter().cloned())
            .collect())
    }

    async fn find_referencing_symbols(
        &self,
        name_path: &NamePathPattern,
        relative_path: &str,
        _include_body: bool,
        kinds: &KindFilter,
    ) -> SymbolResult<Vec<ReferenceInSymbol>> {
        resolve_in(&self.files.lock().unwrap(), name_path, relative_path)?;
        Ok(self
            .references
            .lock()
            .unwrap()
            .iter()
            .filter(|r| kinds.accepts(r.symbol.kind))
            .cloned()
            .collect())
    }
}

/// An edit recorded by [`MockCodeEditor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditCall {
    pub operation: &'static str,
    pub name_path: String,
    pub relative_path: String,
    pub text: String,
}

/// A code editor that records edits against a fixed symbol table.
#[derive(Clone, Default)]
pub struct MockCodeEditor {
    files: Arc<Mutex<BTreeMap<String, Vec<Symbol>>>>,
    calls: Arc<Mutex<Vec<EditCall>>>,
    rename_status: Arc<Mutex<Option<String>>>,
}

impl MockCodeEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, relative_path: &str, mut symbols: Vec<Symbol>) -> Self {
        assign_overload_indices(&mut symbols);
        self.files
            .lock()
            .unwrap()
            .insert(relative_path.to_string(), symbols);
        self
    }

    /// Status returned by `rename_symbol` instead of the default success message.
    pub fn with_rename_status(self, status: &str) -> Self {
        *self.rename_status.lock().unwrap() = Some(status.to_string());
        self
    }

    pub fn calls(&self) -> Vec<EditCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(
        &self,
        operation: &'static str,
        name_path: &NamePathPattern,
        relative_path: &str,
        text: &str,
    ) -> SymbolResult<Symbol> {
        let symbol = resolve_in(&self.files.lock().unwrap(), name_path, relative_path)?;
        self.calls.lock().unwrap().push(EditCall {
            operation,
            name_path: name_path.to_string(),
            relative_path: relative_path.to_string(),
            text: text.to_string(),
        });
        Ok(symbol)
    }
}

#[async_trait]
impl CodeEditor for MockCodeEditor {
    async fn replace_body(
        &self,
        name_path: &NamePathPattern,
        relative_path: &str,
        body: &str,
    ) -> SymbolResult<()> {
        self.record("replace_body", name_path, relative_path, body)
            .map(drop)
    }

    async fn insert_after_symbol(
        &self,
        name_path: &NamePathPattern,
        relative_path: &str,
        content: &str,
    ) -> SymbolResult<()> {
        self.record("insert_after", name_path, relative_path, content)
            .map(drop)
    }

    async fn insert_before_symbol(
        &self,
        name_path: &NamePathPattern,
        relative_path: &str,
        content: &str,
    ) -> SymbolResult<()> {
        self.record("insert_before", name_path, relative_path, content)
            .map(drop)
    }

    async fn rename_symbol(
        &self,
        name_path: &NamePathPattern,
        relative_path: &str,
        new_name: &str,
    ) -> SymbolResult<String> {
        let symbol = self.record("rename", name_path, relative_path, new_name)?;
        Ok(self
            .rename_status
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| format!("Successfully renamed '{}' to '{new_name}'.", symbol.name)))
    }
}

/// A language server session with canned answers.
#[derive(Clone, Default)]
pub struct MockLspSession {
    hover: Arc<Mutex<Option<Value>>>,
    definitions: Arc<Mutex<Vec<RawLocation>>>,
    references: Arc<Mutex<Vec<RawLocation>>>,
    defining_symbol: Arc<Mutex<Option<Symbol>>>,
    unavailable: Arc<Mutex<bool>>,
    restarts: Arc<AtomicUsize>,
}

impl MockLspSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hover(self, raw: Value) -> Self {
        *self.hover.lock().unwrap() = Some(raw);
        self
    }

    pub fn with_definitions(self, locations: Vec<RawLocation>) -> Self {
        *self.definitions.lock().unwrap() = locations;
        self
    }

    pub fn with_references(self, locations: Vec<RawLocation>) -> Self {
        *self.references.lock().unwrap() = locations;
        self
    }

    pub fn with_defining_symbol(self, symbol: Symbol) -> Self {
        *self.defining_symbol.lock().unwrap() = Some(symbol);
        self
    }

    /// Fail every request as if no server were running, until restarted.
    pub fn unavailable(self) -> Self {
        *self.unavailable.lock().unwrap() = true;
        self
    }

    pub fn restart_count(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }

    fn check(&self) -> SymbolResult<()> {
        if *self.unavailable.lock().unwrap() {
            Err(SymbolError::Unavailable("mock server is down".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LspSession for MockLspSession {
    async fn request_hover(&self, _: &str, _: u32, _: u32) -> SymbolResult<Option<Value>> {
        self.check()?;
        Ok(self.hover.lock().unwrap().clone())
    }

    async fn request_definition(&self, _: &str, _: u32, _: u32) -> SymbolResult<Vec<RawLocation>> {
        self.check()?;
        Ok(self.definitions.lock().unwrap().clone())
    }

    async fn request_references(&self, _: &str, _: u32, _: u32) -> SymbolResult<Vec<RawLocation>> {
        self.check()?;
        Ok(self.references.lock().unwrap().clone())
    }

    async fn request_defining_symbol(
        &self,
        _: &str,
        _: u32,
        _: u32,
        include_body: bool,
    ) -> SymbolResult<Option<Symbol>> {
        self.check()?;
        let mut symbol = self.defining_symbol.lock().unwrap().clone();
        if !include_body {
            if let Some(symbol) = symbol.as_mut() {
                symbol.body = None;
            }
        }
        Ok(symbol)
    }

    async fn restart(&self) -> SymbolResult<()> {
        self.restarts.fetch_add(1, Ordering::SeqCst);
        *self.unavailable.lock().unwrap() = false;
        Ok(())
    }
}

/// A project whose files live in memory.
#[derive(Clone)]
pub struct MockProject {
    root: PathBuf,
    files: Arc<Mutex<HashMap<String, String>>>,
}

impl MockProject {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_file(self, relative_path: &str, content: &str) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(relative_path.to_string(), content.to_string());
        self
    }
}

#[async_trait]
impl Project for MockProject {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn retrieve_content_around_line(
        &self,
        relative_path: &str,
        line: u32,
        context_lines_before: usize,
        context_lines_after: usize,
    ) -> SymbolResult<Snippet> {
        let files = self.files.lock().unwrap();
        let content = files.get(relative_path).ok_or_else(|| {
            SymbolError::not_found(format!("File {relative_path} does not exist in the project."))
        })?;
        Ok(Snippet::around(
            content,
            line as usize,
            context_lines_before,
            context_lines_after,
        ))
    }
}
