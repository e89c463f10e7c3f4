//! LSP transport implementation (JSON-RPC over stdio).

use crate::error::{LspError, LspResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// JSON-RPC request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Turn the response into its result, surfacing a JSON-RPC error as [`LspError::ServerError`].
    /// A missing result is reported as `Value::Null`.
    pub fn into_result(self) -> LspResult<Value> {
        if let Some(error) = self.error {
            return Err(LspError::ServerError {
                code: error.code,
                message: error.message,
            });
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

/// JSON-RPC error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// JSON-RPC notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
        }
    }
}

/// What the server sent us, as far as request routing cares.
#[derive(Debug, PartialEq)]
enum Incoming {
    Response(Option<u64>),
    ServerRequest { id: Value, method: String },
    Notification(String),
}

fn classify(message: &Value) -> Incoming {
    let method = message.get("method").and_then(Value::as_str);
    let id = message.get("id").filter(|id| !id.is_null());
    match (method, id) {
        (Some(method), Some(id)) => Incoming::ServerRequest {
            id: id.clone(),
            method: method.to_string(),
        },
        (Some(method), None) => Incoming::Notification(method.to_string()),
        (None, id) => Incoming::Response(id.and_then(Value::as_u64)),
    }
}

/// Build the reply for a request the server sent to us.
///
/// We advertise no dynamic capabilities, so every request gets an empty
/// success; `workspace/configuration` needs one entry per requested item.
fn reply_to_server_request(id: Value, method: &str, message: &Value) -> Value {
    let result = if method == "workspace/configuration" {
        let items = message
            .pointer("/params/items")
            .and_then(Value::as_array)
            .map(|items| items.len())
            .unwrap_or(0);
        Value::Array(vec![Value::Null; items])
    } else {
        Value::Null
    };
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

/// Read one `Content-Length` framed message.
async fn read_message<R>(reader: &mut R) -> LspResult<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length: Option<usize> = None;
    loop {
        let mut line = String::new();
        let bytes = reader.read_line(&mut line).await?;
        if bytes == 0 {
            return Err(LspError::connection_failed("Server closed connection"));
        }

        let line = line.trim();
        if line.is_empty() {
            break;
        }

        if let Some(len_str) = line.strip_prefix("Content-Length: ") {
            content_length = Some(
                len_str
                    .parse()
                    .map_err(|_| LspError::protocol_error("Invalid Content-Length"))?,
            );
        }
    }

    let content_length =
        content_length.ok_or_else(|| LspError::protocol_error("Missing Content-Length header"))?;

    let mut content = vec![0u8; content_length];
    reader.read_exact(&mut content).await?;

    let content = String::from_utf8(content)
        .map_err(|e| LspError::protocol_error(format!("Invalid UTF-8: {e}")))?;

    trace!(content = %content, "Received LSP message");
    Ok(content)
}

/// LSP transport over stdio.
pub struct LspTransport {
    child: Mutex<Option<Child>>,
    stdin: Mutex<Option<ChildStdin>>,
    /// Held for the whole request/response exchange, so at most one request
    /// is in flight per server.
    stdout: Mutex<Option<BufReader<ChildStdout>>>,
}

impl LspTransport {
    /// Create a new LSP transport by spawning the server process.
    pub async fn new(
        command: &str,
        args: &[String],
        env: &std::collections::HashMap<String, String>,
        cwd: Option<&std::path::Path>,
    ) -> LspResult<Self> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .envs(env)
            .kill_on_drop(true);

        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        debug!(command = command, args = ?args, "Starting LSP server");

        let mut child = cmd
            .spawn()
            .map_err(|e| LspError::ProcessError(format!("Failed to start server: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| LspError::ProcessError("Failed to get stdin".to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| LspError::ProcessError("Failed to get stdout".to_string()))?;

        Ok(Self {
            child: Mutex::new(Some(child)),
            stdin: Mutex::new(Some(stdin)),
            stdout: Mutex::new(Some(BufReader::new(stdout))),
        })
    }

    /// Send a request and wait for its response.
    ///
    /// Notifications received meanwhile are dropped; requests from the server
    /// are answered so it does not stall waiting on us.
    pub async fn request(&self, request: JsonRpcRequest) -> LspResult<JsonRpcResponse> {
        let mut stdout_guard = self.stdout.lock().await;
        let stdout = stdout_guard
            .as_mut()
            .ok_or_else(|| LspError::connection_failed("Transport closed"))?;

        self.send_message(&serde_json::to_string(&request)?).await?;

        loop {
            let raw = read_message(stdout).await?;
            let message: Value = serde_json::from_str(&raw)
                .map_err(|e| LspError::protocol_error(format!("Invalid message: {e}")))?;

            match classify(&message) {
                Incoming::Response(Some(id)) if id == request.id => {
                    return serde_json::from_value(message)
                        .map_err(|e| LspError::protocol_error(format!("Invalid response: {e}")));
                }
                Incoming::Response(id) => {
                    debug!(?id, expected = request.id, "Discarding unrelated response");
                }
                Incoming::ServerRequest { id, method } => {
                    trace!(method = %method, "Answering server request");
                    let reply = reply_to_server_request(id, &method, &message);
                    self.send_message(&reply.to_string()).await?;
                }
                Incoming::Notification(method) => {
                    trace!(method = %method, "Ignoring server notification");
                }
            }
        }
    }

    /// Send a notification.
    pub async fn notify(&self, notification: JsonRpcNotification) -> LspResult<()> {
        self.send_message(&serde_json::to_string(&notification)?)
            .await
    }

    /// Send an LSP message with Content-Length header.
    async fn send_message(&self, content: &str) -> LspResult<()> {
        let mut stdin_guard = self.stdin.lock().await;
        let stdin = stdin_guard
            .as_mut()
            .ok_or_else(|| LspError::connection_failed("Transport closed"))?;

        let message = format!("Content-Length: {}\r\n\r\n{}", content.len(), content);
        trace!(message = %content, "Sending LSP message");

        stdin.write_all(message.as_bytes()).await?;
        stdin.flush().await?;

        Ok(())
    }

    /// Close the transport.
    pub async fn close(&self) -> LspResult<()> {
        *self.stdin.lock().await = None;

        let mut child_guard = self.child.lock().await;
        if let Some(mut child) = child_guard.take() {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            let _ = child.kill().await;
        }

        debug!("Closed LSP server transport");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn frame(body: &str) -> String {
        format!("Content-Length: {}\r\n\r\n{}", body.len(), body)
    }

    #[tokio::test]
    async fn test_transport_creation_failure() {
        let result = LspTransport::new("nonexistent_lsp_12345", &[], &HashMap::new(), None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_read_message_frames() {
        let input = format!("{}{}", frame(r#"{"a":1}"#), frame(r#"{"b":2}"#));
        let mut reader = input.as_bytes();

        assert_eq!(read_message(&mut reader).await.unwrap(), r#"{"a":1}"#);
        assert_eq!(read_message(&mut reader).await.unwrap(), r#"{"b":2}"#);
        assert!(read_message(&mut reader).await.is_err());
    }

    #[tokio::test]
    async fn test_read_message_missing_length() {
        let mut reader = "Content-Type: x\r\n\r\n{}".as_bytes();
        let err = read_message(&mut reader).await.unwrap_err();
        assert!(err.to_string().contains("Missing Content-Length"));
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            classify(&json!({"jsonrpc": "2.0", "id": 4, "result": null})),
            Incoming::Response(Some(4))
        );
        assert_eq!(
            classify(&json!({"jsonrpc": "2.0", "method": "window/logMessage", "params": {}})),
            Incoming::Notification("window/logMessage".to_string())
        );
        assert_eq!(
            classify(&json!({"jsonrpc": "2.0", "id": "x", "method": "client/registerCapability"})),
            Incoming::ServerRequest {
                id: json!("x"),
                method: "client/registerCapability".to_string()
            }
        );
    }

    #[test]
    fn test_configuration_reply_has_one_entry_per_item() {
        let message = json!({
            "id": 7,
            "method": "workspace/configuration",
            "params": {"items": [{"section": "a"}, {"section": "b"}]}
        });
        let reply = reply_to_server_request(json!(7), "workspace/configuration", &message);
        assert_eq!(reply["result"], json!([null, null]));
        assert_eq!(reply["id"], json!(7));
    }

    #[test]
    fn test_into_result_surfaces_server_error() {
        let response: JsonRpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32803, "message": "rename conflict"}
        }))
        .unwrap();
        let err = response.into_result().unwrap_err();
        assert!(matches!(err, LspError::ServerError { code: -32803, .. }));
    }
}
