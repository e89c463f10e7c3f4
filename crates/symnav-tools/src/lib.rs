//! Tool implementations for symnav.
//!
//! Each tool wraps one symbol operation: it validates JSON arguments, runs the
//! operation and returns its text output. Tools are registered by id in a
//! [`ToolRegistry`].

pub mod error;
pub mod registry;

// Tool implementations
pub mod edit;
pub mod navigate;
pub mod position;
pub mod restart;

pub use error::{ToolError, ToolResult};
pub use registry::ToolRegistry;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use symnav_symbols::SymbolResult;
use tokio_util::sync::CancellationToken;

/// Context provided to tools during execution.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Cancellation token.
    pub abort: CancellationToken,
    /// Project root directory.
    pub root_dir: PathBuf,
}

impl ToolContext {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            abort: CancellationToken::new(),
            root_dir: root_dir.into(),
        }
    }

    /// Fail with [`ToolError::Cancelled`] if the call was aborted.
    pub fn check_cancelled(&self) -> ToolResult<()> {
        if self.abort.is_cancelled() {
            Err(ToolError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Run a read-only operation, abandoning it when the call is aborted.
    pub async fn run<T>(&self, operation: impl Future<Output = SymbolResult<T>>) -> ToolResult<T> {
        self.check_cancelled()?;
        tokio::select! {
            _ = self.abort.cancelled() => Err(ToolError::Cancelled),
            result = operation => result.map_err(ToolError::from),
        }
    }
}

/// Result of tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Title/summary of the operation.
    pub title: String,
    /// Output text.
    pub output: String,
    /// Tool-specific metadata.
    pub metadata: Value,
}

impl ToolOutput {
    /// Create a new tool output.
    pub fn new(title: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            output: output.into(),
            metadata: Value::Null,
        }
    }

    /// Add metadata to the output.
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// The main trait for tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool ID.
    fn id(&self) -> &str;

    /// Get the tool description (for the AI).
    fn description(&self) -> &str;

    /// Get the JSON Schema for the tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool.
    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult<ToolOutput>;
}

/// A boxed tool for dynamic dispatch.
pub type BoxedTool = Arc<dyn Tool>;

/// Deserialize tool arguments, reporting failures as validation errors.
pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> ToolResult<T> {
    serde_json::from_value(args)
        .map_err(|e| ToolError::validation(format!("Invalid arguments: {}", e)))
}

pub(crate) fn default_max_answer_chars() -> i64 {
    symnav_symbols::USE_DEFAULT_MAX_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use symnav_symbols::SymbolError;

    #[test]
    fn test_tool_output_with_metadata() {
        let output = ToolOutput::new("Title", "Content").with_metadata(json!({"key": "value"}));
        assert_eq!(output.title, "Title");
        assert_eq!(output.output, "Content");
        assert_eq!(output.metadata["key"], "value");
    }

    #[test]
    fn test_parse_args_reports_validation_error() {
        #[derive(Debug, serde::Deserialize)]
        struct Args {
            #[allow(dead_code)]
            relative_path: String,
        }
        let err = parse_args::<Args>(json!({"line": 1})).unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
    }

    #[tokio::test]
    async fn test_run_maps_errors() {
        let ctx = ToolContext::new("/project");
        let err = ctx
            .run(async { Err::<(), _>(SymbolError::not_found("x")) })
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_run_honors_cancellation() {
        let ctx = ToolContext::new("/project");
        ctx.abort.cancel();
        let err = ctx.run(async { Ok(1) }).await.unwrap_err();
        assert!(matches!(err, ToolError::Cancelled));

        let ctx = ToolContext::new("/project");
        let abort = ctx.abort.clone();
        let pending = ctx.run(std::future::pending::<SymbolResult<()>>());
        abort.cancel();
        assert!(matches!(pending.await, Err(ToolError::Cancelled)));
    }
}
