//! Tools addressed by file position.
//!
//! Lines and characters are zero-based; characters count UTF-16 code units
//! like the language server protocol.

use crate::{default_max_answer_chars, parse_args, Tool, ToolContext, ToolOutput, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use symnav_symbols::SymbolOperations;

#[derive(Debug, Deserialize)]
struct PositionArgs {
    relative_path: String,
    line: u32,
    character: u32,
    #[serde(default = "default_max_answer_chars")]
    max_answer_chars: i64,
    #[serde(default)]
    include_body: bool,
}

impl PositionArgs {
    fn metadata(&self) -> Value {
        json!({
            "relative_path": self.relative_path,
            "line": self.line,
            "character": self.character,
        })
    }
}

fn position_schema(extra: Value) -> Value {
    let mut schema = json!({
        "type": "object",
        "required": ["relative_path", "line", "character"],
        "properties": {
            "relative_path": {
                "type": "string",
                "description": "Project-relative path of the file"
            },
            "line": {
                "type": "integer",
                "minimum": 0,
                "description": "Line number (0-based)"
            },
            "character": {
                "type": "integer",
                "minimum": 0,
                "description": "Character offset within the line (0-based)"
            }
        }
    });
    if let (Some(props), Value::Object(extra)) = (schema["properties"].as_object_mut(), extra) {
        props.extend(extra);
    }
    schema
}

fn max_answer_chars_property() -> Value {
    json!({
        "max_answer_chars": {
            "type": "integer",
            "description": "Answers longer than this are replaced by a notice. -1 uses the configured default."
        }
    })
}

/// Hover text at a position.
pub struct GetHoverInfoTool {
    ops: SymbolOperations,
}

impl GetHoverInfoTool {
    pub fn new(ops: SymbolOperations) -> Self {
        Self { ops }
    }
}

#[async_trait]
impl Tool for GetHoverInfoTool {
    fn id(&self) -> &str {
        "get_hover_info"
    }

    fn description(&self) -> &str {
        "Returns the hover information (type signature, documentation) the language server shows for the code at a position."
    }

    fn parameters_schema(&self) -> Value {
        position_schema(json!({}))
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult<ToolOutput> {
        let args: PositionArgs = parse_args(args)?;
        let output = ctx
            .run(
                self.ops
                    .get_hover_info(&args.relative_path, args.line, args.character),
            )
            .await?;
        Ok(ToolOutput::new("Hover", output).with_metadata(args.metadata()))
    }
}

/// Where the symbol at a position is defined.
pub struct GetDefinitionLocationsTool {
    ops: SymbolOperations,
}

impl GetDefinitionLocationsTool {
    pub fn new(ops: SymbolOperations) -> Self {
        Self { ops }
    }
}

#[async_trait]
impl Tool for GetDefinitionLocationsTool {
    fn id(&self) -> &str {
        "get_definition_locations"
    }

    fn description(&self) -> &str {
        "Returns the definition locations of the symbol at a position, each with its file, range and a code snippet."
    }

    fn parameters_schema(&self) -> Value {
        position_schema(max_answer_chars_property())
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult<ToolOutput> {
        let args: PositionArgs = parse_args(args)?;
        let output = ctx
            .run(self.ops.get_definition_locations(
                &args.relative_path,
                args.line,
                args.character,
                args.max_answer_chars,
            ))
            .await?;
        Ok(ToolOutput::new("Definitions", output).with_metadata(args.metadata()))
    }
}

/// Where the symbol at a position is referenced.
pub struct GetReferenceLocationsTool {
    ops: SymbolOperations,
}

impl GetReferenceLocationsTool {
    pub fn new(ops: SymbolOperations) -> Self {
        Self { ops }
    }
}

#[async_trait]
impl Tool for GetReferenceLocationsTool {
    fn id(&self) -> &str {
        "get_reference_locations"
    }

    fn description(&self) -> &str {
        "Returns all locations referencing the symbol at a position, including its declaration, each with a code snippet."
    }

    fn parameters_schema(&self) -> Value {
        position_schema(max_answer_chars_property())
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult<ToolOutput> {
        let args: PositionArgs = parse_args(args)?;
        let output = ctx
            .run(self.ops.get_reference_locations(
                &args.relative_path,
                args.line,
                args.character,
                args.max_answer_chars,
            ))
            .await?;
        Ok(ToolOutput::new("References", output).with_metadata(args.metadata()))
    }
}

/// The symbol that defines the code at a position.
pub struct GetDefiningSymbolTool {
    ops: SymbolOperations,
}

impl GetDefiningSymbolTool {
    pub fn new(ops: SymbolOperations) -> Self {
        Self { ops }
    }
}

#[async_trait]
impl Tool for GetDefiningSymbolTool {
    fn id(&self) -> &str {
        "get_defining_symbol"
    }

    fn description(&self) -> &str {
        "Resolves the code at a position to the symbol that defines it and returns that symbol \
(optionally with its body) together with its definition locations."
    }

    fn parameters_schema(&self) -> Value {
        let mut extra = max_answer_chars_property();
        extra["include_body"] = json!({
            "type": "boolean",
            "description": "Include the source code of the defining symbol (default: false)"
        });
        position_schema(extra)
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult<ToolOutput> {
        let args: PositionArgs = parse_args(args)?;
        let output = ctx
            .run(self.ops.get_defining_symbol(
                &args.relative_path,
                args.line,
                args.character,
                args.include_body,
                args.max_answer_chars,
            ))
            .await?;
        Ok(ToolOutput::new("Defining symbol", output).with_metadata(args.metadata()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_schema_merges_extra_properties() {
        let schema = position_schema(max_answer_chars_property());
        assert!(schema["properties"]["relative_path"].is_object());
        assert!(schema["properties"]["max_answer_chars"].is_object());
        assert_eq!(schema["required"], json!(["relative_path", "line", "character"]));
    }

    #[test]
    fn test_negative_line_is_rejected() {
        let err = parse_args::<PositionArgs>(json!({
            "relative_path": "a.py",
            "line": -1,
            "character": 0
        }));
        assert!(err.is_err());
    }
}
