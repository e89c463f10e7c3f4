//! Tool error types.

use symnav_symbols::SymbolError;
use thiserror::Error;

/// Result type for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Errors that can occur during tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Invalid parameters.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A file, symbol or name path does not resolve.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An internal consistency check failed.
    #[error("Invariant violation: {0}")]
    Invariant(String),

    /// No language server session is available.
    #[error("Language server unavailable: {0}. Try restarting the language server.")]
    Unavailable(String),

    /// Execution failed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// Operation was cancelled.
    #[error("Cancelled")]
    Cancelled,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an execution failed error.
    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::ExecutionFailed(message.into())
    }
}

impl From<SymbolError> for ToolError {
    fn from(error: SymbolError) -> Self {
        match error {
            SymbolError::NotFound(m) => Self::NotFound(m),
            SymbolError::InvalidArgument(m) => Self::Validation(m),
            SymbolError::InvariantViolation(m) => Self::Invariant(m),
            SymbolError::Unavailable(m) => Self::Unavailable(m),
            SymbolError::Io(e) => Self::Io(e),
            SymbolError::Json(e) => Self::Json(e),
            e @ (SymbolError::Lsp(_) | SymbolError::Yaml(_)) => Self::ExecutionFailed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_errors_map_by_category() {
        let err: ToolError = SymbolError::not_found("a.py").into();
        assert!(matches!(err, ToolError::NotFound(m) if m == "a.py"));

        let err: ToolError = SymbolError::invalid_argument("bad kind").into();
        assert!(matches!(err, ToolError::Validation(_)));

        let err: ToolError = SymbolError::invariant("no path").into();
        assert!(matches!(err, ToolError::Invariant(_)));

        let err: ToolError = SymbolError::Unavailable("down".into()).into();
        assert!(err.to_string().contains("restarting"));
    }
}
