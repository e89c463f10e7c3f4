//! Symbolic edits applied to files on disk.

use super::project::read_project_file;
use super::retriever::{find_unique, load_file_symbols};
use super::text::{self, Side};
use crate::collab::CodeEditor;
use crate::error::{SymbolError, SymbolResult};
use crate::name_path::NamePathPattern;
use async_trait::async_trait;
use lsp_types::Range;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use symnav_lsp::{
    uri_to_path, DocumentChangeOperation, DocumentChanges, LspClient, LspError, OneOf, TextEdit,
    WorkspaceEdit,
};
use tracing::{debug, info, warn};

/// Text edits grouped per file, plus the number of changes that could not be applied.
#[derive(Debug, Default)]
struct FileEdits {
    files: BTreeMap<PathBuf, Vec<TextEdit>>,
    skipped: usize,
}

impl FileEdits {
    fn add(&mut self, uri: &symnav_lsp::Uri, edits: impl IntoIterator<Item = TextEdit>) {
        match uri_to_path(uri) {
            Some(path) => self.files.entry(path).or_default().extend(edits),
            None => {
                warn!(uri = uri.as_str(), "Cannot edit non-file uri");
                self.skipped += 1;
            }
        }
    }

    fn edit_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }
}

/// Flatten a workspace edit. `documentChanges` wins over `changes` when both are set.
fn collect_file_edits(edit: WorkspaceEdit) -> FileEdits {
    let mut out = FileEdits::default();
    match edit.document_changes {
        Some(DocumentChanges::Edits(edits)) => {
            for doc in edits {
                out.add(&doc.text_document.uri, doc.edits.into_iter().map(plain_edit));
            }
        }
        Some(DocumentChanges::Operations(ops)) => {
            for op in ops {
                match op {
                    DocumentChangeOperation::Edit(doc) => {
                        out.add(&doc.text_document.uri, doc.edits.into_iter().map(plain_edit));
                    }
                    DocumentChangeOperation::Op(op) => {
                        warn!(?op, "Skipping resource operation in rename");
                        out.skipped += 1;
                    }
                }
            }
        }
        None => {
            for (uri, edits) in edit.changes.unwrap_or_default() {
                out.add(&uri, edits);
            }
        }
    }
    out
}

fn plain_edit(edit: OneOf<TextEdit, lsp_types::AnnotatedTextEdit>) -> TextEdit {
    match edit {
        OneOf::Left(edit) => edit,
        OneOf::Right(annotated) => annotated.text_edit,
    }
}

/// [`CodeEditor`] that resolves symbols through the language server and
/// writes the project files directly.
#[derive(Clone)]
pub struct LspCodeEditor {
    client: Arc<LspClient>,
}

impl LspCodeEditor {
    pub fn new(client: Arc<LspClient>) -> Self {
        Self { client }
    }

    fn root(&self) -> &Path {
        self.client.project_root()
    }

    /// Current file content and the full range of the symbol.
    async fn locate(
        &self,
        name_path: &NamePathPattern,
        relative_path: &str,
    ) -> SymbolResult<(String, Range)> {
        let symbols = load_file_symbols(&self.client, relative_path, false).await?;
        let symbol = find_unique(&symbols, name_path, relative_path)?;
        let range = symbol.range.ok_or_else(|| {
            SymbolError::not_found(format!(
                "Symbol {} in {relative_path} has no range",
                symbol.name_path_string()
            ))
        })?;
        let source = read_project_file(self.root(), relative_path).await?;
        Ok((source, range))
    }

    async fn write(&self, path: &Path, content: &str) -> SymbolResult<()> {
        tokio::fs::write(path, content).await?;
        if let Err(e) = self.client.touch_file(path).await {
            warn!(file = %path.display(), error = %e, "Edited file could not be synced");
        }
        Ok(())
    }

    async fn apply_file_edits(&self, path: &Path, edits: &[TextEdit]) -> SymbolResult<()> {
        let source = tokio::fs::read_to_string(path).await?;
        let changed = text::apply_edits(&source, edits);
        self.write(path, &changed).await
    }

    async fn write_project_file(&self, relative_path: &str, content: &str) -> SymbolResult<()> {
        self.write(&self.root().join(relative_path), content).await
    }
}

#[async_trait]
impl CodeEditor for LspCodeEditor {
    async fn replace_body(
        &self,
        name_path: &NamePathPattern,
        relative_path: &str,
        body: &str,
    ) -> SymbolResult<()> {
        let (source, range) = self.locate(name_path, relative_path).await?;
        debug!(symbol = %name_path, file = relative_path, ?range, "Replacing body");
        let changed = text::replace_range(&source, &range, body.trim());
        self.write_project_file(relative_path, &changed).await
    }

    async fn insert_after_symbol(
        &self,
        name_path: &NamePathPattern,
        relative_path: &str,
        content: &str,
    ) -> SymbolResult<()> {
        let (source, range) = self.locate(name_path, relative_path).await?;
        let changed = text::insert_lines(&source, &range, Side::After, content);
        self.write_project_file(relative_path, &changed).await
    }

    async fn insert_before_symbol(
        &self,
        name_path: &NamePathPattern,
        relative_path: &str,
        content: &str,
    ) -> SymbolResult<()> {
        let (source, range) = self.locate(name_path, relative_path).await?;
        let changed = text::insert_lines(&source, &range, Side::Before, content);
        self.write_project_file(relative_path, &changed).await
    }

    async fn rename_symbol(
        &self,
        name_path: &NamePathPattern,
        relative_path: &str,
        new_name: &str,
    ) -> SymbolResult<String> {
        let symbols = load_file_symbols(&self.client, relative_path, false).await?;
        let symbol = find_unique(&symbols, name_path, relative_path)?;
        let old_name = symbol.name.clone();
        let Some(position) = symbol.identifier_position() else {
            return Err(SymbolError::invariant(format!(
                "Symbol {} has no position",
                symbol.name_path_string()
            )));
        };

        let edit = match self
            .client
            .rename(
                &self.root().join(relative_path),
                position.line,
                position.character,
                new_name,
            )
            .await
        {
            Ok(Some(edit)) => edit,
            Ok(None) => {
                return Ok(format!(
                    "Renaming '{old_name}' to '{new_name}' produced no changes."
                ));
            }
            Err(LspError::ServerError { message, .. }) => {
                return Ok(format!(
                    "Failed to rename '{old_name}' to '{new_name}': {message}"
                ));
            }
            Err(LspError::Unsupported { .. }) => {
                return Ok(format!(
                    "Failed to rename '{old_name}': the language server does not support renaming."
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let edits = collect_file_edits(edit);
        if edits.files.is_empty() {
            return Ok(format!(
                "Renaming '{old_name}' to '{new_name}' produced no changes."
            ));
        }

        let edit_count = edits.edit_count();
        let mut updated = 0usize;
        let mut failed = Vec::new();
        for (path, file_edits) in &edits.files {
            match self.apply_file_edits(path, file_edits).await {
                Ok(()) => updated += 1,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Failed to apply rename edits");
                    failed.push(path.display().to_string());
                }
            }
        }

        info!(from = %old_name, to = new_name, files = updated, edits = edit_count, "Renamed symbol");
        Ok(rename_status(
            &old_name,
            new_name,
            edit_count,
            updated,
            &failed,
            edits.skipped,
        ))
    }
}

fn rename_status(
    old_name: &str,
    new_name: &str,
    edit_count: usize,
    updated: usize,
    failed: &[String],
    skipped: usize,
) -> String {
    if updated == 0 {
        return format!(
            "Failed to rename '{old_name}' to '{new_name}': could not update {}.",
            failed.join(", ")
        );
    }
    let mut status = format!(
        "Successfully renamed '{old_name}' to '{new_name}' ({edit_count} edits in {updated} files)."
    );
    if !failed.is_empty() {
        status.push_str(&format!(" Failed to update: {}.", failed.join(", ")));
    }
    if skipped > 0 {
        status.push_str(&format!(" Skipped {skipped} unsupported changes."));
    }
    status
}
