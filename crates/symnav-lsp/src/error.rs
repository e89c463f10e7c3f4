//! LSP error types.

use thiserror::Error;

/// Result type for LSP operations.
pub type LspResult<T> = Result<T, LspError>;

/// Errors that can occur during LSP operations.
#[derive(Debug, Error)]
pub enum LspError {
    /// Server not configured.
    #[error("No server configured for file: {0}")]
    NoServerForFile(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Server process failed.
    #[error("Server process error: {0}")]
    ProcessError(String),

    /// Protocol error.
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// The server answered a request with a JSON-RPC error.
    #[error("Server error {code}: {message}")]
    ServerError { code: i64, message: String },

    /// The server does not advertise the capability a request needs.
    #[error("Server '{server}' does not support {method}")]
    Unsupported { server: String, method: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server initialization failed.
    #[error("Server initialization failed: {0}")]
    InitializationFailed(String),

    /// Invalid URI.
    #[error("Invalid URI: {0}")]
    InvalidUri(String),
}

impl LspError {
    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed(message.into())
    }

    /// Create a protocol error.
    pub fn protocol_error(message: impl Into<String>) -> Self {
        Self::ProtocolError(message.into())
    }

    /// Whether the error means no usable server session exists for the request,
    /// as opposed to a failure inside a live session.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::NoServerForFile(_)
                | Self::ConnectionFailed(_)
                | Self::ProcessError(_)
                | Self::InitializationFailed(_)
        )
    }
}
