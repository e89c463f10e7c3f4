//! Positional requests against the language server client.

use super::retriever::load_file_symbols;
use crate::collab::LspSession;
use crate::entry::{relative_path_string, RawLocation};
use crate::error::SymbolResult;
use crate::symbol::{smallest_enclosing, Symbol};
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use symnav_lsp::{uri_to_path, Location, LspClient};
use tracing::debug;

/// Convert a protocol location into a raw location relative to `root`.
pub(crate) fn to_raw_location(location: Location, root: &Path) -> RawLocation {
    let absolute_path = uri_to_path(&location.uri);
    let relative_path = absolute_path
        .as_deref()
        .and_then(|p| relative_path_string(p, root));
    RawLocation {
        uri: location.uri.as_str().to_string(),
        absolute_path,
        relative_path,
        range: Some(location.range),
    }
}

/// [`LspSession`] over a shared [`LspClient`].
#[derive(Clone)]
pub struct ClientSession {
    client: Arc<LspClient>,
}

impl ClientSession {
    pub fn new(client: Arc<LspClient>) -> Self {
        Self { client }
    }

    fn path(&self, relative_path: &str) -> std::path::PathBuf {
        self.client.project_root().join(relative_path)
    }

    fn to_raw(&self, locations: Vec<Location>) -> Vec<RawLocation> {
        let root = self.client.project_root();
        locations
            .into_iter()
            .map(|l| to_raw_location(l, root))
            .collect()
    }
}

#[async_trait]
impl LspSession for ClientSession {
    async fn request_hover(
        &self,
        relative_path: &str,
        line: u32,
        character: u32,
    ) -> SymbolResult<Option<Value>> {
        Ok(self
            .client
            .hover(&self.path(relative_path), line, character)
            .await?)
    }

    async fn request_definition(
        &self,
        relative_path: &str,
        line: u32,
        character: u32,
    ) -> SymbolResult<Vec<RawLocation>> {
        let locations = self
            .client
            .goto_definition(&self.path(relative_path), line, character)
            .await?;
        Ok(self.to_raw(locations))
    }

    async fn request_references(
        &self,
        relative_path: &str,
        line: u32,
        character: u32,
    ) -> SymbolResult<Vec<RawLocation>> {
        let locations = self
            .client
            .find_references(&self.path(relative_path), line, character, true)
            .await?;
        Ok(self.to_raw(locations))
    }

    async fn request_defining_symbol(
        &self,
        relative_path: &str,
        line: u32,
        character: u32,
        include_body: bool,
    ) -> SymbolResult<Option<Symbol>> {
        let definitions = self.request_definition(relative_path, line, character).await?;
        let Some((def_path, position)) = definitions.into_iter().find_map(|d| {
            let start = d.range?.start;
            Some((d.relative_path?, start))
        }) else {
            debug!(file = relative_path, line, character, "No definition inside the project");
            return Ok(None);
        };

        let symbols = load_file_symbols(&self.client, &def_path, include_body).await?;
        Ok(smallest_enclosing(&symbols, position).cloned())
    }

    async fn restart(&self) -> SymbolResult<()> {
        Ok(self.client.restart().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symnav_lsp::{path_to_uri, Position, Range};

    #[test]
    fn test_to_raw_location_inside_project() {
        let root = std::env::temp_dir().join("symnav-session-test");
        let uri = path_to_uri(&root.join("src/lib.rs")).unwrap();
        let range = Range::new(Position::new(3, 4), Position::new(3, 9));

        let raw = to_raw_location(Location::new(uri.clone(), range), &root);
        assert_eq!(raw.uri, uri.as_str());
        assert_eq!(raw.relative_path.as_deref(), Some("src/lib.rs"));
        assert_eq!(raw.range, Some(range));
    }

    #[test]
    fn test_to_raw_location_outside_project() {
        let root = std::env::temp_dir().join("symnav-session-test");
        let elsewhere = std::env::temp_dir().join("elsewhere/lib.rs");
        let uri = path_to_uri(&elsewhere).unwrap();
        let range = Range::new(Position::new(0, 0), Position::new(0, 1));

        let raw = to_raw_location(Location::new(uri, range), &root);
        assert!(raw.relative_path.is_none());
        assert_eq!(raw.absolute_path.as_deref(), Some(elsewhere.as_path()));
    }

    #[tokio::test]
    async fn test_unconfigured_file_is_unavailable() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        let session = ClientSession::new(Arc::new(LspClient::with_configs(dir.path(), vec![])));

        let err = session.request_hover("notes.txt", 0, 0).await.unwrap_err();
        assert!(matches!(err, crate::error::SymbolError::Unavailable(_)));
    }
}
