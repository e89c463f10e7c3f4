//! Language server restart tool.

use crate::{Tool, ToolContext, ToolOutput, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use symnav_symbols::SymbolOperations;
use tracing::info;

/// Drop the current language server sessions.
pub struct RestartLanguageServerTool {
    ops: SymbolOperations,
}

impl RestartLanguageServerTool {
    pub fn new(ops: SymbolOperations) -> Self {
        Self { ops }
    }
}

#[async_trait]
impl Tool for RestartLanguageServerTool {
    fn id(&self) -> &str {
        "restart_language_server"
    }

    fn description(&self) -> &str {
        "Restarts the language server. Use it when the server hangs, reports itself unavailable, \
or answers with stale results after files changed outside the editing tools. \
Name paths and ranges obtained earlier may be outdated afterwards."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _args: Value, ctx: &ToolContext) -> ToolResult<ToolOutput> {
        let output = ctx.run(self.ops.restart_language_server()).await?;
        info!("Language server restart requested");
        Ok(ToolOutput::new("Language server restarted", output))
    }
}
