//! JSON-lines tool server.
//!
//! Each input line is a request `{"id": .., "tool": "find_symbol", "args": {..}}`;
//! each answer is written as one line
//! `{"id": .., "ok": true, "title": .., "output": ..}` or
//! `{"id": .., "ok": false, "error": ..}`. One language server session is kept
//! for the whole run.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use symnav_tools::{ToolContext, ToolRegistry};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct ServeRequest {
    #[serde(default)]
    id: Value,
    tool: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, PartialEq)]
struct ServeResponse {
    id: Value,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Value::is_null")]
    metadata: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ServeResponse {
    fn failure(id: Value, error: impl ToString) -> Self {
        Self {
            id,
            ok: false,
            title: None,
            output: None,
            metadata: Value::Null,
            error: Some(error.to_string()),
        }
    }
}

async fn handle_line(registry: &ToolRegistry, ctx: &ToolContext, line: &str) -> ServeResponse {
    let request: ServeRequest = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => return ServeResponse::failure(Value::Null, format!("Invalid request: {e}")),
    };
    let args = if request.args.is_null() {
        Value::Object(Default::default())
    } else {
        request.args
    };

    debug!(tool = %request.tool, "Serving request");
    match registry.execute(&request.tool, args, ctx).await {
        Ok(out) => ServeResponse {
            id: request.id,
            ok: true,
            title: Some(out.title),
            output: Some(out.output),
            metadata: out.metadata,
            error: None,
        },
        Err(e) => {
            warn!(tool = %request.tool, error = %e, "Tool failed");
            ServeResponse::failure(request.id, e)
        }
    }
}

/// Answer requests until the input ends or `shutdown` fires. Returns the
/// number of requests handled.
pub async fn serve<R, W>(
    registry: &ToolRegistry,
    ctx: &ToolContext,
    shutdown: CancellationToken,
    reader: R,
    mut writer: W,
) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut handled = 0;

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        let request_ctx = ToolContext {
            abort: ctx.abort.child_token(),
            root_dir: ctx.root_dir.clone(),
        };
        let response = handle_line(registry, &request_ctx, &line).await;
        let mut encoded = serde_json::to_string(&response)?;
        encoded.push('\n');
        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;
        handled += 1;
    }

    info!(handled, "Serve loop finished");
    Ok(handled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use symnav_symbols::{OperationSettings, SymbolKind, SymbolOperations};
    use symnav_test_utils::{
        MockCodeEditor, MockLspSession, MockProject, MockSymbolRetriever, SymbolBuilder,
    };

    fn registry(session: MockLspSession) -> ToolRegistry {
        let symbols = vec![SymbolBuilder::new("main", SymbolKind::Function)
            .file("main.go")
            .range(2, 0, 4, 1)
            .build()];
        let ops = SymbolOperations::new(
            Arc::new(MockSymbolRetriever::new().with_file("main.go", symbols.clone())),
            Arc::new(MockCodeEditor::new().with_file("main.go", symbols)),
            Arc::new(session),
            Arc::new(MockProject::new("/project")),
            OperationSettings::default(),
        );
        ToolRegistry::with_symbol_tools(ops)
    }

    async fn run(registry: &ToolRegistry, input: &str) -> Vec<Value> {
        let ctx = ToolContext::new("/project");
        let mut out = Vec::new();
        serve(registry, &ctx, CancellationToken::new(), input.as_bytes(), &mut out)
            .await
            .unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_serve_answers_each_line() {
        let registry = registry(MockLspSession::new());
        let input = concat!(
            r#"{"id": 1, "tool": "find_symbol", "args": {"name_path_pattern": "main"}}"#,
            "\n\n",
            r#"{"id": 2, "tool": "nope"}"#,
            "\n",
            "not json\n",
        );
        let responses = run(&registry, input).await;
        assert_eq!(responses.len(), 3);

        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[0]["ok"], true);
        assert!(responses[0]["output"].as_str().unwrap().contains("name_path: main"));

        assert_eq!(responses[1]["ok"], false);
        assert!(responses[1]["error"].as_str().unwrap().contains("Unknown tool"));

        assert_eq!(responses[2]["id"], Value::Null);
        assert!(responses[2]["error"].as_str().unwrap().starts_with("Invalid request"));
    }

    #[tokio::test]
    async fn test_serve_keeps_session_across_restart() {
        let session = MockLspSession::new().unavailable();
        let registry = registry(session.clone());
        let hover = r#"{"id": "h", "tool": "get_hover_info", "args": {"relative_path": "main.go", "line": 2, "character": 5}}"#;
        let input = format!("{hover}\n{{\"tool\": \"restart_language_server\"}}\n{hover}\n");

        let responses = run(&registry, &input).await;
        assert_eq!(responses[0]["ok"], false);
        assert_eq!(responses[1]["output"], "OK");
        assert_eq!(responses[2]["ok"], true);
        assert_eq!(session.restart_count(), 1);
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let registry = registry(MockLspSession::new());
        let ctx = ToolContext::new("/project");
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let (_keep_open, reader) = tokio::io::duplex(64);
        let handled = serve(
            &registry,
            &ctx,
            shutdown,
            tokio::io::BufReader::new(reader),
            tokio::io::sink(),
        )
        .await
        .unwrap();
        assert_eq!(handled, 0);
    }
}
