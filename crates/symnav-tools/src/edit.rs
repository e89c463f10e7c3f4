//! Symbolic editing tools.
//!
//! Edits run to completion once started; cancellation is only checked before
//! the edit begins so files are never left half-written.

use crate::{parse_args, Tool, ToolContext, ToolError, ToolOutput, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use symnav_symbols::SymbolOperations;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct EditArgs {
    name_path: String,
    relative_path: String,
    body: String,
}

fn edit_schema(body_description: &str) -> Value {
    json!({
        "type": "object",
        "required": ["name_path", "relative_path", "body"],
        "properties": {
            "name_path": {
                "type": "string",
                "description": "Name path of the target symbol (same syntax as find_symbol); must resolve to exactly one symbol"
            },
            "relative_path": {
                "type": "string",
                "description": "File containing the target symbol"
            },
            "body": {
                "type": "string",
                "description": body_description
            }
        }
    })
}

#[derive(Debug, Clone, Copy)]
enum EditKind {
    ReplaceBody,
    InsertAfter,
    InsertBefore,
}

async fn apply_edit(
    ops: &SymbolOperations,
    kind: EditKind,
    args: Value,
    ctx: &ToolContext,
) -> ToolResult<ToolOutput> {
    let args: EditArgs = parse_args(args)?;
    ctx.check_cancelled()?;
    debug!(?kind, symbol = %args.name_path, file = %args.relative_path, "Symbol edit");

    let (title, result) = match kind {
        EditKind::ReplaceBody => (
            "Replaced symbol body",
            ops.replace_symbol_body(&args.name_path, &args.relative_path, &args.body)
                .await,
        ),
        EditKind::InsertAfter => (
            "Inserted after symbol",
            ops.insert_after_symbol(&args.name_path, &args.relative_path, &args.body)
                .await,
        ),
        EditKind::InsertBefore => (
            "Inserted before symbol",
            ops.insert_before_symbol(&args.name_path, &args.relative_path, &args.body)
                .await,
        ),
    };
    let output = result.map_err(ToolError::from)?;
    Ok(ToolOutput::new(title, output).with_metadata(json!({
        "name_path": args.name_path,
        "relative_path": args.relative_path,
    })))
}

/// Replace a symbol's full definition.
pub struct ReplaceSymbolBodyTool {
    ops: SymbolOperations,
}

impl ReplaceSymbolBodyTool {
    pub fn new(ops: SymbolOperations) -> Self {
        Self { ops }
    }
}

#[async_trait]
impl Tool for ReplaceSymbolBodyTool {
    fn id(&self) -> &str {
        "replace_symbol_body"
    }

    fn description(&self) -> &str {
        "Replaces the full definition of a symbol, signature included. Retrieve the current body with \
find_symbol first. The new body must not contain preceding comments, docstrings or imports."
    }

    fn parameters_schema(&self) -> Value {
        edit_schema("New definition of the symbol, starting with its signature line")
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult<ToolOutput> {
        apply_edit(&self.ops, EditKind::ReplaceBody, args, ctx).await
    }
}

/// Insert content after a symbol.
pub struct InsertAfterSymbolTool {
    ops: SymbolOperations,
}

impl InsertAfterSymbolTool {
    pub fn new(ops: SymbolOperations) -> Self {
        Self { ops }
    }
}

#[async_trait]
impl Tool for InsertAfterSymbolTool {
    fn id(&self) -> &str {
        "insert_after_symbol"
    }

    fn description(&self) -> &str {
        "Inserts content on the line after the end of a symbol's definition, e.g. a new method after an existing one."
    }

    fn parameters_schema(&self) -> Value {
        edit_schema("Content to insert, starting on the line after the symbol")
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult<ToolOutput> {
        apply_edit(&self.ops, EditKind::InsertAfter, args, ctx).await
    }
}

/// Insert content before a symbol.
pub struct InsertBeforeSymbolTool {
    ops: SymbolOperations,
}

impl InsertBeforeSymbolTool {
    pub fn new(ops: SymbolOperations) -> Self {
        Self { ops }
    }
}

#[async_trait]
impl Tool for InsertBeforeSymbolTool {
    fn id(&self) -> &str {
        "insert_before_symbol"
    }

    fn description(&self) -> &str {
        "Inserts content before the first line of a symbol's definition, e.g. an import before the first symbol of a file."
    }

    fn parameters_schema(&self) -> Value {
        edit_schema("Content to insert; the symbol moves down below it")
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult<ToolOutput> {
        apply_edit(&self.ops, EditKind::InsertBefore, args, ctx).await
    }
}

/// Rename a symbol across the project.
pub struct RenameSymbolTool {
    ops: SymbolOperations,
}

impl RenameSymbolTool {
    pub fn new(ops: SymbolOperations) -> Self {
        Self { ops }
    }
}

#[derive(Debug, Deserialize)]
struct RenameArgs {
    name_path: String,
    relative_path: String,
    new_name: String,
}

#[async_trait]
impl Tool for RenameSymbolTool {
    fn id(&self) -> &str {
        "rename_symbol"
    }

    fn description(&self) -> &str {
        "Renames a symbol and all its references throughout the project using the language server. \
Returns a status message; refused renames (e.g. name collisions) are reported in the message. \
For overloaded methods the name path may need an overload index."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["name_path", "relative_path", "new_name"],
            "properties": {
                "name_path": {
                    "type": "string",
                    "description": "Name path of the symbol to rename"
                },
                "relative_path": {
                    "type": "string",
                    "description": "File containing the symbol"
                },
                "new_name": {
                    "type": "string",
                    "description": "New name for the symbol"
                }
            }
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult<ToolOutput> {
        let args: RenameArgs = parse_args(args)?;
        ctx.check_cancelled()?;
        let status = self
            .ops
            .rename_symbol(&args.name_path, &args.relative_path, &args.new_name)
            .await?;
        Ok(ToolOutput::new(format!("Rename to {}", args.new_name), status).with_metadata(json!({
            "name_path": args.name_path,
            "relative_path": args.relative_path,
            "new_name": args.new_name,
        })))
    }
}
