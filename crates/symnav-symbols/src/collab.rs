//! Collaborators the symbol operations are built on.
//!
//! Each trait has an LSP/file-system backed implementation in
//! [`crate::backend`]; tests substitute in-memory doubles.

use crate::entry::RawLocation;
use crate::error::SymbolResult;
use crate::name_path::{KindFilter, NamePathPattern, SymbolQuery};
use crate::symbol::{ReferenceInSymbol, Symbol};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Finds symbols in the project.
#[async_trait]
pub trait SymbolRetriever: Send + Sync {
    /// Top-level symbols (with children) per file, for a file or every file below a directory.
    async fn get_overview(&self, relative_path: &str) -> SymbolResult<BTreeMap<String, Vec<Symbol>>>;

    /// Symbols matching a name-path query, across all files in the query's scope.
    async fn find_by_name(&self, query: &SymbolQuery) -> SymbolResult<Vec<Symbol>>;

    /// Symbols containing references to the symbol at `name_path` in `relative_path`.
    async fn find_referencing_symbols(
        &self,
        name_path: &NamePathPattern,
        relative_path: &str,
        include_body: bool,
        kinds: &KindFilter,
    ) -> SymbolResult<Vec<ReferenceInSymbol>>;
}

/// Applies symbolic edits to files.
#[async_trait]
pub trait CodeEditor: Send + Sync {
    async fn replace_body(
        &self,
        name_path: &NamePathPattern,
        relative_path: &str,
        body: &str,
    ) -> SymbolResult<()>;

    async fn insert_after_symbol(
        &self,
        name_path: &NamePathPattern,
        relative_path: &str,
        content: &str,
    ) -> SymbolResult<()>;

    async fn insert_before_symbol(
        &self,
        name_path: &NamePathPattern,
        relative_path: &str,
        content: &str,
    ) -> SymbolResult<()>;

    /// Rename across the project. Failures the server reports come back as a
    /// status message rather than an error.
    async fn rename_symbol(
        &self,
        name_path: &NamePathPattern,
        relative_path: &str,
        new_name: &str,
    ) -> SymbolResult<String>;
}

/// Positional language server requests. Lines and columns are zero-based.
#[async_trait]
pub trait LspSession: Send + Sync {
    /// Raw hover result, `None` when the server has nothing.
    async fn request_hover(
        &self,
        relative_path: &str,
        line: u32,
        character: u32,
    ) -> SymbolResult<Option<Value>>;

    async fn request_definition(
        &self,
        relative_path: &str,
        line: u32,
        character: u32,
    ) -> SymbolResult<Vec<RawLocation>>;

    async fn request_references(
        &self,
        relative_path: &str,
        line: u32,
        character: u32,
    ) -> SymbolResult<Vec<RawLocation>>;

    /// The symbol defining whatever is at the position.
    async fn request_defining_symbol(
        &self,
        relative_path: &str,
        line: u32,
        character: u32,
        include_body: bool,
    ) -> SymbolResult<Option<Symbol>>;

    /// Discard the current server sessions; the next request starts fresh ones.
    async fn restart(&self) -> SymbolResult<()>;
}

/// Access to project files.
#[async_trait]
pub trait Project: Send + Sync {
    fn root(&self) -> &Path;

    /// Lines around a zero-based line, clipped to the file.
    async fn retrieve_content_around_line(
        &self,
        relative_path: &str,
        line: u32,
        context_lines_before: usize,
        context_lines_after: usize,
    ) -> SymbolResult<Snippet>;
}

/// One line of a [`Snippet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetLine {
    /// One-based line number.
    pub number: usize,
    pub text: String,
    pub is_match: bool,
}

/// A window of lines around a line of interest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snippet {
    pub lines: Vec<SnippetLine>,
}

impl Snippet {
    /// Lines `before`/`after` a zero-based line of `content`, clipped to the file.
    /// A line past the end marks the last line.
    pub fn around(content: &str, line: usize, before: usize, after: usize) -> Self {
        let lines: Vec<&str> = content.lines().collect();
        if lines.is_empty() {
            return Self::default();
        }
        let target = line.min(lines.len() - 1);
        let start = target.saturating_sub(before);
        let end = (target + after).min(lines.len() - 1);

        Self {
            lines: (start..=end)
                .map(|i| SnippetLine {
                    number: i + 1,
                    text: lines[i].to_string(),
                    is_match: i == target,
                })
                .collect(),
        }
    }

    /// Render with line numbers, marking the line of interest with `>`.
    pub fn to_display_string(&self) -> String {
        let width = self
            .lines
            .iter()
            .map(|l| l.number.to_string().len())
            .max()
            .unwrap_or(1);
        self.lines
            .iter()
            .map(|l| {
                let marker = if l.is_match { '>' } else { ' ' };
                format!("{marker}{:>width$}|{}", l.number, l.text, width = width)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
