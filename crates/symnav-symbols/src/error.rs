//! Symbol layer error types.

use symnav_lsp::LspError;
use thiserror::Error;

/// Result type for symbol operations.
pub type SymbolResult<T> = Result<T, SymbolError>;

/// Errors that can occur while querying or editing symbols.
#[derive(Debug, Error)]
pub enum SymbolError {
    /// A file, symbol or name path does not resolve.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed pattern, unknown kind value, or a directory where a file is required.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An internal consistency assumption was broken.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// No language server session is available for the request.
    #[error("Language server unavailable: {0}")]
    Unavailable(String),

    /// A live language server failed the request.
    #[error("Language server error: {0}")]
    Lsp(LspError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SymbolError {
    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create an invariant violation error.
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }
}

impl From<LspError> for SymbolError {
    fn from(error: LspError) -> Self {
        match error {
            LspError::Io(e) => Self::Io(e),
            e if e.is_unavailable() => Self::Unavailable(e.to_string()),
            e => Self::Lsp(e),
        }
    }
}
