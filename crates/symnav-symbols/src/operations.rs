//! Agent-facing symbol operations.
//!
//! [`SymbolOperations`] composes the collaborators with the sanitizer, entry
//! builder and trimmer. Every read operation returns serialized text that has
//! already been checked against the answer budget.

use crate::collab::{CodeEditor, LspSession, Project, SymbolRetriever};
use crate::entry::{build_entries, LocationEntry};
use crate::error::{SymbolError, SymbolResult};
use crate::hover::hover_text;
use crate::name_path::{normalize_scope, KindFilter, NamePathPattern, SymbolQuery};
use crate::output::OutputFormat;
use crate::sanitize::{SanitizeOptions, SanitizedSymbol};
use crate::trim::{effective_limit, limit_length, DEFAULT_MAX_ANSWER_CHARS, USE_DEFAULT_MAX_CHARS};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Result returned by edit operations that succeed.
pub const SUCCESS_RESULT: &str = "OK";

/// Note attached to a defining-symbol answer without a symbol.
pub const NO_DEFINING_SYMBOL: &str = "No defining symbol found.";

/// Lines of context shown around each reference of a referencing symbol.
const REFERENCE_CONTEXT_LINES: usize = 1;

/// Settings shared by all operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSettings {
    pub output_format: OutputFormat,
    pub default_max_answer_chars: usize,
}

impl Default for OperationSettings {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            default_max_answer_chars: DEFAULT_MAX_ANSWER_CHARS,
        }
    }
}

/// Parameters of [`SymbolOperations::find_symbol`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindSymbolRequest {
    pub name_path_pattern: String,
    pub depth: usize,
    /// File or directory to search in; empty searches the whole project.
    pub relative_path: Option<String>,
    pub include_body: bool,
    pub include_kinds: Vec<i64>,
    pub exclude_kinds: Vec<i64>,
    pub substring_matching: bool,
    pub max_answer_chars: i64,
}

impl FindSymbolRequest {
    pub fn new(name_path_pattern: impl Into<String>) -> Self {
        Self {
            name_path_pattern: name_path_pattern.into(),
            depth: 0,
            relative_path: None,
            include_body: false,
            include_kinds: Vec::new(),
            exclude_kinds: Vec::new(),
            substring_matching: false,
            max_answer_chars: USE_DEFAULT_MAX_CHARS,
        }
    }
}

#[derive(Debug, Serialize)]
struct DefiningSymbolAnswer {
    #[serde(skip_serializing_if = "Option::is_none")]
    symbol: Option<SanitizedSymbol>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    definitions: Vec<LocationEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
}

/// The symbol operation façade.
#[derive(Clone)]
pub struct SymbolOperations {
    retriever: Arc<dyn SymbolRetriever>,
    editor: Arc<dyn CodeEditor>,
    session: Arc<dyn LspSession>,
    project: Arc<dyn Project>,
    settings: OperationSettings,
}

impl SymbolOperations {
    pub fn new(
        retriever: Arc<dyn SymbolRetriever>,
        editor: Arc<dyn CodeEditor>,
        session: Arc<dyn LspSession>,
        project: Arc<dyn Project>,
        settings: OperationSettings,
    ) -> Self {
        Self {
            retriever,
            editor,
            session,
            project,
            settings,
        }
    }

    pub fn settings(&self) -> OperationSettings {
        self.settings
    }

    pub fn project(&self) -> &Arc<dyn Project> {
        &self.project
    }

    fn finish<T: Serialize + ?Sized>(&self, value: &T, max_answer_chars: i64) -> SymbolResult<String> {
        let rendered = self.settings.output_format.render(value)?;
        let limit = effective_limit(max_answer_chars, self.settings.default_max_answer_chars);
        Ok(limit_length(rendered, limit))
    }

    /// Top-level symbols of a single file.
    pub async fn get_symbols_overview(
        &self,
        relative_path: &str,
        max_answer_chars: i64,
    ) -> SymbolResult<String> {
        let path = self.project.root().join(relative_path);
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SymbolError::not_found(format!(
                    "File or directory {relative_path} does not exist in the project."
                )));
            }
            Err(e) => return Err(e.into()),
        };
        if metadata.is_dir() {
            return Err(SymbolError::invalid_argument(format!(
                "Expected a file path, but got a directory path: {relative_path}."
            )));
        }

        let mut overview = self.retriever.get_overview(relative_path).await?;
        let symbols = overview.remove(relative_path).unwrap_or_default();
        debug!(file = relative_path, count = symbols.len(), "Symbols overview");

        let sanitized: Vec<SanitizedSymbol> = symbols
            .iter()
            .map(|s| s.sanitize(SanitizeOptions::new(0, false)))
            .collect();
        self.finish(&sanitized, max_answer_chars)
    }

    /// Symbols matching a name-path pattern.
    pub async fn find_symbol(&self, request: &FindSymbolRequest) -> SymbolResult<String> {
        let kinds = KindFilter::from_values(&request.include_kinds, &request.exclude_kinds)?;
        let pattern = NamePathPattern::parse(&request.name_path_pattern)?;
        let scope = request
            .relative_path
            .as_deref()
            .map(normalize_scope)
            .transpose()?;
        let query = SymbolQuery::new(pattern)
            .with_kinds(kinds)
            .with_substring_matching(request.substring_matching)
            .within(scope)
            .with_body(request.include_body);

        let symbols = self.retriever.find_by_name(&query).await?;
        debug!(pattern = %query.pattern, count = symbols.len(), "Found symbols");

        let options = SanitizeOptions::new(request.depth, request.include_body);
        let sanitized: Vec<SanitizedSymbol> = symbols.iter().map(|s| s.sanitize(options)).collect();
        self.finish(&sanitized, request.max_answer_chars)
    }

    /// Symbols referencing the symbol at `name_path`, each with a line of context
    /// around the reference. Bodies are never included.
    pub async fn find_referencing_symbols(
        &self,
        name_path: &str,
        relative_path: &str,
        include_kinds: &[i64],
        exclude_kinds: &[i64],
        max_answer_chars: i64,
    ) -> SymbolResult<String> {
        let kinds = KindFilter::from_values(include_kinds, exclude_kinds)?;
        let pattern = NamePathPattern::parse(name_path)?;

        let references = self
            .retriever
            .find_referencing_symbols(&pattern, relative_path, false, &kinds)
            .await?;

        let mut out = Vec::with_capacity(references.len());
        for reference in references {
            let Some(ref_path) = reference.symbol.relative_path() else {
                return Err(SymbolError::invariant(format!(
                    "Referencing symbol {} has no relative path",
                    reference.symbol.name
                )));
            };
            let context = self
                .project
                .retrieve_content_around_line(
                    ref_path,
                    reference.line,
                    REFERENCE_CONTEXT_LINES,
                    REFERENCE_CONTEXT_LINES,
                )
                .await?;
            out.push(
                reference
                    .symbol
                    .sanitize(SanitizeOptions::new(0, false))
                    .with_content_around_reference(context.to_display_string()),
            );
        }
        self.finish(&out, max_answer_chars)
    }

    /// Hover text at a position. Never trimmed.
    pub async fn get_hover_info(
        &self,
        relative_path: &str,
        line: u32,
        character: u32,
    ) -> SymbolResult<String> {
        let raw = self
            .session
            .request_hover(relative_path, line, character)
            .await?;
        Ok(hover_text(raw.as_ref()))
    }

    pub async fn get_definition_locations(
        &self,
        relative_path: &str,
        line: u32,
        character: u32,
        max_answer_chars: i64,
    ) -> SymbolResult<String> {
        let raw = self
            .session
            .request_definition(relative_path, line, character)
            .await?;
        let entries = build_entries(raw, self.project.as_ref()).await;
        self.finish(&entries, max_answer_chars)
    }

    pub async fn get_reference_locations(
        &self,
        relative_path: &str,
        line: u32,
        character: u32,
        max_answer_chars: i64,
    ) -> SymbolResult<String> {
        let raw = self
            .session
            .request_references(relative_path, line, character)
            .await?;
        let entries = build_entries(raw, self.project.as_ref()).await;
        self.finish(&entries, max_answer_chars)
    }

    /// The symbol defining the code at a position, plus its definition locations.
    pub async fn get_defining_symbol(
        &self,
        relative_path: &str,
        line: u32,
        character: u32,
        include_body: bool,
        max_answer_chars: i64,
    ) -> SymbolResult<String> {
        let symbol = self
            .session
            .request_defining_symbol(relative_path, line, character, include_body)
            .await?;
        let definitions = self
            .session
            .request_definition(relative_path, line, character)
            .await?;
        let definitions = build_entries(definitions, self.project.as_ref()).await;

        let answer = DefiningSymbolAnswer {
            error: symbol.is_none().then_some(NO_DEFINING_SYMBOL),
            symbol: symbol.map(|s| s.sanitize(SanitizeOptions::full(include_body))),
            definitions,
        };
        self.finish(&answer, max_answer_chars)
    }

    pub async fn replace_symbol_body(
        &self,
        name_path: &str,
        relative_path: &str,
        body: &str,
    ) -> SymbolResult<String> {
        let pattern = NamePathPattern::parse(name_path)?;
        self.editor.replace_body(&pattern, relative_path, body).await?;
        info!(symbol = %pattern, file = relative_path, "Replaced symbol body");
        Ok(SUCCESS_RESULT.to_string())
    }

    pub async fn insert_after_symbol(
        &self,
        name_path: &str,
        relative_path: &str,
        content: &str,
    ) -> SymbolResult<String> {
        let pattern = NamePathPattern::parse(name_path)?;
        self.editor
            .insert_after_symbol(&pattern, relative_path, content)
            .await?;
        info!(symbol = %pattern, file = relative_path, "Inserted after symbol");
        Ok(SUCCESS_RESULT.to_string())
    }

    pub async fn insert_before_symbol(
        &self,
        name_path: &str,
        relative_path: &str,
        content: &str,
    ) -> SymbolResult<String> {
        let pattern = NamePathPattern::parse(name_path)?;
        self.editor
            .insert_before_symbol(&pattern, relative_path, content)
            .await?;
        info!(symbol = %pattern, file = relative_path, "Inserted before symbol");
        Ok(SUCCESS_RESULT.to_string())
    }

    /// Rename project-wide; returns the editor's status message.
    pub async fn rename_symbol(
        &self,
        name_path: &str,
        relative_path: &str,
        new_name: &str,
    ) -> SymbolResult<String> {
        if new_name.trim().is_empty() {
            return Err(SymbolError::invalid_argument("New name must not be empty"));
        }
        let pattern = NamePathPattern::parse(name_path)?;
        self.editor
            .rename_symbol(&pattern, relative_path, new_name)
            .await
    }

    pub async fn restart_language_server(&self) -> SymbolResult<String> {
        self.session.restart().await?;
        info!("Language server session restarted");
        Ok(SUCCESS_RESULT.to_string())
    }
}
