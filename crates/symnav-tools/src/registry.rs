//! Tool registry.

use crate::edit::{InsertAfterSymbolTool, InsertBeforeSymbolTool, RenameSymbolTool, ReplaceSymbolBodyTool};
use crate::navigate::{FindReferencingSymbolsTool, FindSymbolTool, GetSymbolsOverviewTool};
use crate::position::{
    GetDefiningSymbolTool, GetDefinitionLocationsTool, GetHoverInfoTool, GetReferenceLocationsTool,
};
use crate::restart::RestartLanguageServerTool;
use crate::{BoxedTool, ToolContext, ToolError, ToolOutput, ToolResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use symnav_symbols::SymbolOperations;
use tracing::debug;

/// Registry of available tools.
pub struct ToolRegistry {
    tools: HashMap<String, BoxedTool>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Create a registry with every symbol tool, all sharing `ops`.
    pub fn with_symbol_tools(ops: SymbolOperations) -> Self {
        let mut registry = Self::new();

        registry.register(Arc::new(GetSymbolsOverviewTool::new(ops.clone())));
        registry.register(Arc::new(FindSymbolTool::new(ops.clone())));
        registry.register(Arc::new(FindReferencingSymbolsTool::new(ops.clone())));
        registry.register(Arc::new(GetHoverInfoTool::new(ops.clone())));
        registry.register(Arc::new(GetDefinitionLocationsTool::new(ops.clone())));
        registry.register(Arc::new(GetReferenceLocationsTool::new(ops.clone())));
        registry.register(Arc::new(GetDefiningSymbolTool::new(ops.clone())));
        registry.register(Arc::new(ReplaceSymbolBodyTool::new(ops.clone())));
        registry.register(Arc::new(InsertAfterSymbolTool::new(ops.clone())));
        registry.register(Arc::new(InsertBeforeSymbolTool::new(ops.clone())));
        registry.register(Arc::new(RenameSymbolTool::new(ops.clone())));
        registry.register(Arc::new(RestartLanguageServerTool::new(ops)));

        registry
    }

    /// Register a tool.
    pub fn register(&mut self, tool: BoxedTool) {
        self.tools.insert(tool.id().to_string(), tool);
    }

    /// Remove a tool, returning it if it was registered.
    pub fn unregister(&mut self, id: &str) -> Option<BoxedTool> {
        self.tools.remove(id)
    }

    /// Get a tool by ID.
    pub fn get(&self, id: &str) -> Option<&BoxedTool> {
        self.tools.get(id)
    }

    /// List all tool IDs, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Get all tools.
    pub fn all(&self) -> impl Iterator<Item = &BoxedTool> {
        self.tools.values()
    }

    /// Look up a tool and execute it.
    pub async fn execute(&self, id: &str, args: Value, ctx: &ToolContext) -> ToolResult<ToolOutput> {
        let tool = self
            .get(id)
            .ok_or_else(|| ToolError::validation(format!("Unknown tool: {id}")))?;
        debug!(tool = id, "Executing tool");
        tool.execute(args, ctx).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
