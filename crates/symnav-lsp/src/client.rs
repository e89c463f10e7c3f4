//! LSP client implementation.

use crate::config::LspConfig;
use crate::error::{LspError, LspResult};
use crate::transport::{JsonRpcNotification, JsonRpcRequest, LspTransport};
use lsp_types::{
    ClientCapabilities, DidChangeTextDocumentParams, DidOpenTextDocumentParams, DocumentSymbol,
    DocumentSymbolClientCapabilities, DocumentSymbolParams, GotoDefinitionParams, HoverParams,
    InitializeParams, InitializeResult, InitializedParams, Location, PartialResultParams, Position,
    Range, ReferenceContext, ReferenceParams, RenameParams, ServerCapabilities, SymbolInformation,
    SymbolKind, TextDocumentClientCapabilities, TextDocumentContentChangeEvent,
    TextDocumentIdentifier, TextDocumentItem, TextDocumentPositionParams, Uri,
    VersionedTextDocumentIdentifier, WorkDoneProgressParams, WorkspaceEdit, WorkspaceFolder,
};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify, RwLock};
use tracing::{debug, error, info, warn};

/// A connected language server.
struct ServerConnection {
    config: LspConfig,
    transport: Arc<LspTransport>,
    /// Server capabilities advertised during initialization.
    capabilities: ServerCapabilities,
    /// Open documents keyed by URI, with the last version sent.
    documents: Mutex<HashMap<String, i32>>,
}

/// The request kinds this client issues, with the capability each one needs.
#[derive(Debug, Clone, Copy)]
enum Method {
    Definition,
    References,
    Hover,
    DocumentSymbol,
    Rename,
}

impl Method {
    fn name(self) -> &'static str {
        match self {
            Method::Definition => "textDocument/definition",
            Method::References => "textDocument/references",
            Method::Hover => "textDocument/hover",
            Method::DocumentSymbol => "textDocument/documentSymbol",
            Method::Rename => "textDocument/rename",
        }
    }

    fn supported_by(self, capabilities: &ServerCapabilities) -> bool {
        match self {
            Method::Definition => capabilities.definition_provider.is_some(),
            Method::References => capabilities.references_provider.is_some(),
            Method::Hover => capabilities.hover_provider.is_some(),
            Method::DocumentSymbol => capabilities.document_symbol_provider.is_some(),
            Method::Rename => capabilities.rename_provider.is_some(),
        }
    }
}

/// LSP client managing the language server sessions of one project.
///
/// - Tracks broken servers to avoid repeated spawn attempts
/// - Deduplicates concurrent spawn attempts for the same server
/// - Keeps opened documents in sync before each request
pub struct LspClient {
    /// Available configurations (not yet connected).
    configs: Vec<LspConfig>,
    /// Connected servers keyed by "root_path:server_id".
    servers: RwLock<HashMap<String, Arc<ServerConnection>>>,
    /// Broken server+root combinations (failed to spawn or initialize).
    broken: RwLock<HashSet<String>>,
    /// In-flight spawn operations to deduplicate concurrent requests.
    spawning: Mutex<HashMap<String, Arc<Notify>>>,
    /// Request ID counter.
    next_id: AtomicU64,
    /// Project root directory.
    project_root: PathBuf,
}

impl LspClient {
    /// Create a client for `project_root` with no server configurations.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            configs: Vec::new(),
            servers: RwLock::new(HashMap::new()),
            broken: RwLock::new(HashSet::new()),
            spawning: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            project_root: project_root.into(),
        }
    }

    /// Create a client with default configurations.
    pub fn with_defaults(project_root: impl Into<PathBuf>) -> Self {
        Self::with_configs(project_root, crate::config::default_configs())
    }

    /// Create a client with the given configurations.
    pub fn with_configs(project_root: impl Into<PathBuf>, configs: Vec<LspConfig>) -> Self {
        let mut client = Self::new(project_root);
        client.configs = configs;
        client
    }

    /// The project root every server is started in.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Add a server configuration.
    pub fn add_config(&mut self, config: LspConfig) {
        self.configs.push(config);
    }

    /// Get the key for a server+root combination.
    fn server_key(server_id: &str, root: &Path) -> String {
        format!("{}:{}", root.display(), server_id)
    }

    /// Whether any enabled configuration handles this file.
    pub fn handles_file(&self, file_path: &Path) -> bool {
        self.configs
            .iter()
            .any(|c| c.enabled && c.handles_file(file_path))
    }

    /// Get or spawn servers for a file, with deduplication and broken tracking.
    async fn get_servers_for_file(
        &self,
        file_path: &Path,
    ) -> LspResult<Vec<Arc<ServerConnection>>> {
        let mut result = Vec::new();

        let applicable_configs: Vec<_> = self
            .configs
            .iter()
            .filter(|c| c.enabled && c.handles_file(file_path))
            .cloned()
            .collect();

        for config in applicable_configs {
            let key = Self::server_key(&config.language, &self.project_root);

            if self.broken.read().await.contains(&key) {
                continue;
            }

            if let Some(conn) = self.servers.read().await.get(&key) {
                result.push(Arc::clone(conn));
                continue;
            }

            let notify = {
                let mut spawning = self.spawning.lock().await;
                if let Some(notify) = spawning.get(&key) {
                    Some(Arc::clone(notify))
                } else {
                    spawning.insert(key.clone(), Arc::new(Notify::new()));
                    None
                }
            };

            if let Some(notify) = notify {
                notify.notified().await;
                if let Some(conn) = self.servers.read().await.get(&key) {
                    result.push(Arc::clone(conn));
                }
                continue;
            }

            match self.spawn_server(config.clone()).await {
                Ok(conn) => {
                    let conn = Arc::new(conn);
                    self.servers
                        .write()
                        .await
                        .insert(key.clone(), Arc::clone(&conn));
                    result.push(conn);
                    info!(server = %config.language, root = %self.project_root.display(), "LSP server connected");
                }
                Err(e) => {
                    error!(server = %config.language, error = %e, "Failed to spawn LSP server");
                    self.broken.write().await.insert(key.clone());
                }
            }

            if let Some(notify) = self.spawning.lock().await.remove(&key) {
                notify.notify_waiters();
            }
        }

        if result.is_empty() {
            Err(LspError::NoServerForFile(file_path.display().to_string()))
        } else {
            Ok(result)
        }
    }

    /// Spawn and initialize a language server.
    async fn spawn_server(&self, config: LspConfig) -> LspResult<ServerConnection> {
        info!(language = %config.language, command = %config.command, "Spawning LSP server");

        let root = &self.project_root;
        let transport = Arc::new(
            LspTransport::new(&config.command, &config.args, &config.env, Some(root)).await?,
        );

        let workspace_folder = WorkspaceFolder {
            uri: path_to_uri(root)?,
            name: root
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("workspace")
                .to_string(),
        };

        let init_params = InitializeParams {
            process_id: Some(std::process::id()),
            workspace_folders: Some(vec![workspace_folder]),
            capabilities: ClientCapabilities {
                text_document: Some(TextDocumentClientCapabilities {
                    document_symbol: Some(DocumentSymbolClientCapabilities {
                        hierarchical_document_symbol_support: Some(true),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        };

        let request = JsonRpcRequest::new(
            self.next_request_id(),
            "initialize",
            Some(serde_json::to_value(&init_params)?),
        );

        let response = transport.request(request).await?;
        if let Some(error) = response.error {
            return Err(LspError::InitializationFailed(error.message));
        }

        let init_result: InitializeResult = serde_json::from_value(
            response
                .result
                .ok_or_else(|| LspError::protocol_error("Missing initialize result"))?,
        )
        .map_err(|e| LspError::protocol_error(e.to_string()))?;

        debug!(language = %config.language, "LSP server initialized");

        transport
            .notify(JsonRpcNotification::new(
                "initialized",
                Some(serde_json::to_value(InitializedParams {})?),
            ))
            .await?;

        Ok(ServerConnection {
            config,
            transport,
            capabilities: init_result.capabilities,
            documents: Mutex::new(HashMap::new()),
        })
    }

    /// Resolve a path against the project root.
    fn absolute(&self, file_path: &Path) -> PathBuf {
        if file_path.is_absolute() {
            file_path.to_path_buf()
        } else {
            self.project_root.join(file_path)
        }
    }

    /// Send the current file content to a server: `didOpen` the first time,
    /// a full-text `didChange` afterwards.
    async fn sync_document(&self, server: &ServerConnection, file_path: &Path) -> LspResult<()> {
        let uri = path_to_uri(file_path)?;
        let text = tokio::fs::read_to_string(file_path).await?;

        let mut documents = server.documents.lock().await;
        let notification = match documents.get_mut(uri.as_str()) {
            Some(version) => {
                *version += 1;
                let params = DidChangeTextDocumentParams {
                    text_document: VersionedTextDocumentIdentifier {
                        uri,
                        version: *version,
                    },
                    content_changes: vec![TextDocumentContentChangeEvent {
                        range: None,
                        range_length: None,
                        text,
                    }],
                };
                JsonRpcNotification::new(
                    "textDocument/didChange",
                    Some(serde_json::to_value(&params)?),
                )
            }
            None => {
                documents.insert(uri.as_str().to_string(), 1);
                let language_id = file_path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(ext_to_language_id)
                    .unwrap_or("plaintext");
                let params = DidOpenTextDocumentParams {
                    text_document: TextDocumentItem {
                        uri,
                        language_id: language_id.to_string(),
                        version: 1,
                        text,
                    },
                };
                JsonRpcNotification::new(
                    "textDocument/didOpen",
                    Some(serde_json::to_value(&params)?),
                )
            }
        };
        drop(documents);

        server.transport.notify(notification).await
    }

    /// Make every applicable server see the current content of a file.
    ///
    /// Call this after editing a file outside of the servers' knowledge.
    pub async fn touch_file(&self, file_path: &Path) -> LspResult<()> {
        let file_path = self.absolute(file_path);
        for server in self.get_servers_for_file(&file_path).await? {
            if let Err(e) = self.sync_document(&server, &file_path).await {
                warn!(file = %file_path.display(), error = %e, "Failed to sync document");
            }
        }
        Ok(())
    }

    /// Send `method` to the first capable server that returns a non-null result.
    ///
    /// Returns `Ok(None)` when capable servers answered with nothing, and
    /// [`LspError::Unsupported`] when no server for the file has the capability.
    async fn request_first(
        &self,
        file_path: &Path,
        method: Method,
        params: Value,
    ) -> LspResult<Option<Value>> {
        let servers = self.get_servers_for_file(file_path).await?;
        let mut capable = Vec::new();
        for server in servers {
            if method.supported_by(&server.capabilities) {
                capable.push(server);
            } else {
                debug!(server = %server.config.language, method = method.name(), "Server lacks capability");
            }
        }

        if capable.is_empty() {
            return Err(LspError::Unsupported {
                server: file_path.display().to_string(),
                method: method.name().to_string(),
            });
        }

        let mut last_error = None;
        for server in capable {
            self.sync_document(&server, file_path).await?;

            let request =
                JsonRpcRequest::new(self.next_request_id(), method.name(), Some(params.clone()));
            match server.transport.request(request).await.and_then(|r| r.into_result()) {
                Ok(Value::Null) => continue,
                Ok(result) => return Ok(Some(result)),
                Err(e) => {
                    warn!(server = %server.config.language, method = method.name(), error = %e, "LSP request failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    /// Like [`Self::request_first`], treating a missing capability as an empty answer.
    async fn request_optional(
        &self,
        file_path: &Path,
        method: Method,
        params: Value,
    ) -> LspResult<Option<Value>> {
        match self.request_first(file_path, method, params).await {
            Err(LspError::Unsupported { .. }) => Ok(None),
            other => other,
        }
    }

    fn position_params(file_path: &Path, line: u32, column: u32) -> LspResult<TextDocumentPositionParams> {
        Ok(TextDocumentPositionParams {
            text_document: TextDocumentIdentifier {
                uri: path_to_uri(file_path)?,
            },
            position: Position {
                line,
                character: column,
            },
        })
    }

    /// Go to definition.
    pub async fn goto_definition(
        &self,
        file_path: &Path,
        line: u32,
        column: u32,
    ) -> LspResult<Vec<Location>> {
        let file_path = self.absolute(file_path);
        let params = GotoDefinitionParams {
            text_document_position_params: Self::position_params(&file_path, line, column)?,
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        };

        match self
            .request_optional(&file_path, Method::Definition, serde_json::to_value(&params)?)
            .await?
        {
            Some(result) => Ok(parse_goto_definition_response(result)),
            None => Ok(Vec::new()),
        }
    }

    /// Find references.
    pub async fn find_references(
        &self,
        file_path: &Path,
        line: u32,
        column: u32,
        include_declaration: bool,
    ) -> LspResult<Vec<Location>> {
        let file_path = self.absolute(file_path);
        let params = ReferenceParams {
            text_document_position: Self::position_params(&file_path, line, column)?,
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
            context: ReferenceContext {
                include_declaration,
            },
        };

        match self
            .request_optional(&file_path, Method::References, serde_json::to_value(&params)?)
            .await?
        {
            Some(result) => Ok(serde_json::from_value(result)?),
            None => Ok(Vec::new()),
        }
    }

    /// Get the symbol tree of a document.
    pub async fn document_symbols(&self, file_path: &Path) -> LspResult<Vec<DocumentSymbolInfo>> {
        let file_path = self.absolute(file_path);
        let params = DocumentSymbolParams {
            text_document: TextDocumentIdentifier {
                uri: path_to_uri(&file_path)?,
            },
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        };

        match self
            .request_optional(
                &file_path,
                Method::DocumentSymbol,
                serde_json::to_value(&params)?,
            )
            .await?
        {
            Some(result) => parse_document_symbols(result),
            None => Ok(Vec::new()),
        }
    }

    /// Get the raw hover result at a position, `None` when the server has nothing to show.
    pub async fn hover(&self, file_path: &Path, line: u32, column: u32) -> LspResult<Option<Value>> {
        let file_path = self.absolute(file_path);
        let params = HoverParams {
            text_document_position_params: Self::position_params(&file_path, line, column)?,
            work_done_progress_params: WorkDoneProgressParams::default(),
        };

        self.request_optional(&file_path, Method::Hover, serde_json::to_value(&params)?)
            .await
    }

    /// Ask the server for the workspace edit that renames the symbol at a position.
    ///
    /// A server refusing the rename (e.g. because of a name collision) surfaces as
    /// [`LspError::ServerError`].
    pub async fn rename(
        &self,
        file_path: &Path,
        line: u32,
        column: u32,
        new_name: &str,
    ) -> LspResult<Option<WorkspaceEdit>> {
        let file_path = self.absolute(file_path);
        let params = RenameParams {
            text_document_position: Self::position_params(&file_path, line, column)?,
            new_name: new_name.to_string(),
            work_done_progress_params: WorkDoneProgressParams::default(),
        };

        match self
            .request_first(&file_path, Method::Rename, serde_json::to_value(&params)?)
            .await?
        {
            Some(result) => Ok(Some(serde_json::from_value(result)?)),
            None => Ok(None),
        }
    }

    /// Close all server connections.
    pub async fn close_all(&self) -> LspResult<()> {
        let mut servers = self.servers.write().await;
        for (name, conn) in servers.drain() {
            if let Err(e) = conn.transport.close().await {
                warn!(language = %name, error = %e, "Error closing server");
            }
        }
        Ok(())
    }

    /// Drop every session and forget failed spawns; servers are started again on next use.
    pub async fn restart(&self) -> LspResult<()> {
        info!(root = %self.project_root.display(), "Restarting language servers");
        self.close_all().await?;
        self.broken.write().await.clear();
        Ok(())
    }

    /// Languages with a live server connection.
    pub async fn connected_languages(&self) -> Vec<String> {
        let servers = self.servers.read().await;
        let mut languages: Vec<String> = servers
            .values()
            .map(|conn| conn.config.language.clone())
            .collect();
        languages.sort();
        languages
    }
}

/// Symbol information as reported by `textDocument/documentSymbol`, always hierarchical.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSymbolInfo {
    pub name: String,
    pub kind: SymbolKind,
    pub range: Range,
    pub selection_range: Range,
    pub children: Vec<DocumentSymbolInfo>,
}

/// Convert a file path to a URI.
pub fn path_to_uri(path: &Path) -> LspResult<Uri> {
    let url = url::Url::from_file_path(path)
        .map_err(|_| LspError::InvalidUri(format!("not an absolute path: {}", path.display())))?;
    url.as_str()
        .parse()
        .map_err(|e| LspError::InvalidUri(format!("{}: {}", path.display(), e)))
}

/// Convert a `file:` URI back to a path; `None` for other schemes.
pub fn uri_to_path(uri: &Uri) -> Option<PathBuf> {
    url::Url::parse(uri.as_str()).ok()?.to_file_path().ok()
}

fn ext_to_language_id(ext: &str) -> &'static str {
    match ext {
        "rs" => "rust",
        "ts" => "typescript",
        "tsx" => "typescriptreact",
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "javascriptreact",
        "py" | "pyi" => "python",
        "go" => "go",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" | "hpp" | "cc" | "cxx" | "hxx" => "cpp",
        "cs" => "csharp",
        "rb" | "rake" => "ruby",
        "php" => "php",
        "kt" | "kts" => "kotlin",
        "lua" => "lua",
        _ => "plaintext",
    }
}

/// Parse a goto definition response: a single location, a location list or a link list.
fn parse_goto_definition_response(value: Value) -> Vec<Location> {
    if value.is_null() {
        return Vec::new();
    }

    if let Ok(loc) = serde_json::from_value::<Location>(value.clone()) {
        return vec![loc];
    }

    if let Ok(locs) = serde_json::from_value::<Vec<Location>>(value.clone()) {
        return locs;
    }

    if let Ok(links) = serde_json::from_value::<Vec<lsp_types::LocationLink>>(value) {
        return links
            .into_iter()
            .map(|link| Location {
                uri: link.target_uri,
                range: link.target_selection_range,
            })
            .collect();
    }

    Vec::new()
}

/// Parse a document symbols response.
fn parse_document_symbols(value: Value) -> LspResult<Vec<DocumentSymbolInfo>> {
    if let Ok(symbols) = serde_json::from_value::<Vec<DocumentSymbol>>(value.clone()) {
        return Ok(symbols.into_iter().map(convert_document_symbol).collect());
    }

    let symbols = serde_json::from_value::<Vec<SymbolInformation>>(value)
        .map_err(|e| LspError::protocol_error(format!("Invalid documentSymbol result: {e}")))?;
    Ok(nest_flat_symbols(
        symbols
            .into_iter()
            .map(|s| DocumentSymbolInfo {
                name: s.name,
                kind: s.kind,
                range: s.location.range,
                selection_range: s.location.range,
                children: Vec::new(),
            })
            .collect(),
    ))
}

fn convert_document_symbol(symbol: DocumentSymbol) -> DocumentSymbolInfo {
    DocumentSymbolInfo {
        name: symbol.name,
        kind: symbol.kind,
        range: symbol.range,
        selection_range: symbol.selection_range,
        children: symbol
            .children
            .unwrap_or_default()
            .into_iter()
            .map(convert_document_symbol)
            .collect(),
    }
}

fn range_contains(outer: &Range, inner: &Range) -> bool {
    outer.start <= inner.start && inner.end <= outer.end && outer != inner
}

/// Rebuild a hierarchy from a flat `SymbolInformation` list using range containment.
fn nest_flat_symbols(mut flat: Vec<DocumentSymbolInfo>) -> Vec<DocumentSymbolInfo> {
    // Outer symbols first: earlier start, then later end.
    flat.sort_by(|a, b| {
        a.range
            .start
            .cmp(&b.range.start)
            .then(b.range.end.cmp(&a.range.end))
    });

    fn attach(stack: &mut Vec<DocumentSymbolInfo>, roots: &mut Vec<DocumentSymbolInfo>) {
        if let Some(done) = stack.pop() {
            match stack.last_mut() {
                Some(parent) => parent.children.push(done),
                None => roots.push(done),
            }
        }
    }

    let mut roots = Vec::new();
    let mut stack: Vec<DocumentSymbolInfo> = Vec::new();
    for symbol in flat {
        while stack
            .last()
            .is_some_and(|open| !range_contains(&open.range, &symbol.range))
        {
            attach(&mut stack, &mut roots);
        }
        stack.push(symbol);
    }
    while !stack.is_empty() {
        attach(&mut stack, &mut roots);
    }
    roots
}
