//! Symbol navigation and editing for symnav.
//!
//! A source tree is seen as a forest of [`Symbol`]s per file, addressed by
//! name paths such as `MyClass/my_method`. This crate resolves name-path
//! patterns, turns raw language server answers into compact serialized
//! output, and issues symbolic edits.
//!
//! The entry point is [`SymbolOperations`], which works against four
//! collaborators:
//!
//! - [`SymbolRetriever`] finds symbols by file or name path
//! - [`CodeEditor`] applies edits addressed by name path
//! - [`LspSession`] answers positional requests (hover, definition, references)
//! - [`Project`] reads file content around a line
//!
//! [`backend`] implements all four on top of [`symnav_lsp::LspClient`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use symnav_lsp::LspClient;
//! use symnav_symbols::{backend, FindSymbolRequest, OperationSettings};
//!
//! # async fn example() -> symnav_symbols::SymbolResult<()> {
//! let client = Arc::new(LspClient::with_defaults("/path/to/project"));
//! let ops = backend::operations_for_client(client, OperationSettings::default());
//!
//! let mut request = FindSymbolRequest::new("Config/load");
//! request.include_body = true;
//! println!("{}", ops.find_symbol(&request).await?);
//! # Ok(())
//! # }
//! ```

pub mod backend;
mod collab;
mod entry;
mod error;
mod format;
mod hover;
mod kind;
mod name_path;
mod operations;
mod output;
mod sanitize;
mod symbol;
mod trim;

pub use collab::{CodeEditor, LspSession, Project, Snippet, SnippetLine, SymbolRetriever};
pub use entry::{build_entries, relative_path_string, LocationEntry, RawLocation, ENTRY_CONTEXT_LINES};
pub use error::{SymbolError, SymbolResult};
pub use format::format_range;
pub use hover::{hover_text, HoverContents, HoverPart, MarkedValue, NO_HOVER_CONTENT, NO_HOVER_INFO};
pub use kind::{RawKind, SymbolKind};
pub use name_path::{normalize_scope, path_in_scope, KindFilter, NamePathPattern, SymbolQuery};
pub use operations::{
    FindSymbolRequest, OperationSettings, SymbolOperations, NO_DEFINING_SYMBOL, SUCCESS_RESULT,
};
pub use output::OutputFormat;
pub use sanitize::{normalize_body, SanitizeOptions, SanitizedSymbol};
pub use symbol::{
    assign_overload_indices, smallest_enclosing, walk, ReferenceInSymbol, Symbol, SymbolLocation,
};
pub use trim::{
    effective_limit, limit_length, ANSWER_TOO_LONG, DEFAULT_MAX_ANSWER_CHARS, USE_DEFAULT_MAX_CHARS,
};

// Re-export the range types symbols are expressed in
pub use lsp_types::{Position, Range};
