//! Language Server Protocol (LSP) sessions for symnav.
//!
//! This crate owns the language server processes of a project and exposes the
//! positional requests the symbol layer is built on:
//! - Lazy activation on first request for a file
//! - Broken server tracking (avoids repeated spawn failures)
//! - Spawning deduplication (concurrent requests share spawn)
//! - Document synchronization (`didOpen` / `didChange`) before each request
//! - Explicit restart of all sessions
//!
//! # Operations
//!
//! - Go to definition
//! - Find references
//! - Document symbols (hierarchical, flat lists are nested by range)
//! - Hover information (raw result)
//! - Rename (workspace edit)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐     ┌────────────────┐
//! │   symnav    │────▶│ LspClient  │────▶│  Lang Server   │
//! │  (symbols)  │◀────│            │◀────│ (rust-analyzer)│
//! └─────────────┘     └────────────┘     └────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use symnav_lsp::LspClient;
//! use std::path::Path;
//!
//! # async fn example() -> symnav_lsp::LspResult<()> {
//! let client = LspClient::with_defaults("/path/to/project");
//!
//! let locations = client
//!     .goto_definition(Path::new("src/main.rs"), 10, 5)
//!     .await?;
//! for location in locations {
//!     println!("{}", location.uri.as_str());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
mod config;
mod error;
mod transport;

pub use client::{path_to_uri, uri_to_path, DocumentSymbolInfo, LspClient};
pub use config::{apply_overrides, default_configs, LspConfig};
pub use error::{LspError, LspResult};

// Re-export useful lsp-types
pub use lsp_types::{
    DocumentChangeOperation, DocumentChanges, Location, OneOf, Position, Range, SymbolKind,
    TextEdit, Uri, WorkspaceEdit,
};
