//! Collaborators backed by a language server client and the file system.

mod editor;
mod project;
mod retriever;
mod session;
pub mod text;

pub use editor::LspCodeEditor;
pub use project::FsProject;
pub use retriever::LspSymbolRetriever;
pub use session::ClientSession;

use crate::operations::{OperationSettings, SymbolOperations};
use std::sync::Arc;
use symnav_lsp::LspClient;

/// Build the operation façade over one shared client.
///
/// All collaborators talk to the same server sessions, so restarting through
/// the façade affects every later query and edit.
pub fn operations_for_client(client: Arc<LspClient>, settings: OperationSettings) -> SymbolOperations {
    let root = client.project_root().to_path_buf();
    SymbolOperations::new(
        Arc::new(LspSymbolRetriever::new(Arc::clone(&client))),
        Arc::new(LspCodeEditor::new(Arc::clone(&client))),
        Arc::new(ClientSession::new(client)),
        Arc::new(FsProject::new(root)),
        settings,
    )
}
