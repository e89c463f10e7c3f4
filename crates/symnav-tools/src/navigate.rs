//! Symbol lookup tools addressed by file and name path.

use crate::{default_max_answer_chars, parse_args, Tool, ToolContext, ToolOutput, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use symnav_symbols::{FindSymbolRequest, SymbolOperations};

fn max_answer_chars_schema() -> Value {
    json!({
        "type": "integer",
        "description": "Answers longer than this are replaced by a notice. -1 uses the configured default; only raise it when a narrower query is impossible."
    })
}

fn kinds_schema(verb: &str) -> Value {
    json!({
        "type": "array",
        "items": { "type": "integer", "minimum": 1, "maximum": 26 },
        "description": format!("LSP symbol kinds to {verb} (1=file, 5=class, 6=method, 12=function, 13=variable, ...)")
    })
}

/// Top-level symbols of one file.
pub struct GetSymbolsOverviewTool {
    ops: SymbolOperations,
}

impl GetSymbolsOverviewTool {
    pub fn new(ops: SymbolOperations) -> Self {
        Self { ops }
    }
}

#[derive(Debug, Deserialize)]
struct OverviewArgs {
    relative_path: String,
    #[serde(default = "default_max_answer_chars")]
    max_answer_chars: i64,
}

#[async_trait]
impl Tool for GetSymbolsOverviewTool {
    fn id(&self) -> &str {
        "get_symbols_overview"
    }

    fn description(&self) -> &str {
        "Lists the top-level symbols (classes, functions, variables, ...) of a file with their kinds and ranges. \
Start here when exploring an unfamiliar file. Directories are rejected."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["relative_path"],
            "properties": {
                "relative_path": {
                    "type": "string",
                    "description": "Project-relative path of the file"
                },
                "max_answer_chars": max_answer_chars_schema()
            }
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult<ToolOutput> {
        let args: OverviewArgs = parse_args(args)?;
        let output = ctx
            .run(
                self.ops
                    .get_symbols_overview(&args.relative_path, args.max_answer_chars),
            )
            .await?;
        Ok(ToolOutput::new(format!("Symbols in {}", args.relative_path), output)
            .with_metadata(json!({ "relative_path": args.relative_path })))
    }
}

/// Symbols matching a name-path pattern.
pub struct FindSymbolTool {
    ops: SymbolOperations,
}

impl FindSymbolTool {
    pub fn new(ops: SymbolOperations) -> Self {
        Self { ops }
    }
}

#[derive(Debug, Deserialize)]
struct FindSymbolArgs {
    name_path_pattern: String,
    #[serde(default)]
    depth: usize,
    #[serde(default)]
    relative_path: String,
    #[serde(default)]
    include_body: bool,
    #[serde(default)]
    include_kinds: Vec<i64>,
    #[serde(default)]
    exclude_kinds: Vec<i64>,
    #[serde(default)]
    substring_matching: bool,
    #[serde(default = "default_max_answer_chars")]
    max_answer_chars: i64,
}

impl From<FindSymbolArgs> for FindSymbolRequest {
    fn from(args: FindSymbolArgs) -> Self {
        Self {
            name_path_pattern: args.name_path_pattern,
            depth: args.depth,
            relative_path: Some(args.relative_path).filter(|p| !p.is_empty()),
            include_body: args.include_body,
            include_kinds: args.include_kinds,
            exclude_kinds: args.exclude_kinds,
            substring_matching: args.substring_matching,
            max_answer_chars: args.max_answer_chars,
        }
    }
}

#[async_trait]
impl Tool for FindSymbolTool {
    fn id(&self) -> &str {
        "find_symbol"
    }

    fn description(&self) -> &str {
        r#"Finds symbols by name path pattern.

A name path is the chain of enclosing symbol names, e.g. "MyClass/my_method".
- "method": any symbol named "method", at any nesting level
- "MyClass/method": "method" directly inside "MyClass", wherever "MyClass" is nested
- "/MyClass/method": only the top-level "MyClass"
- "MyClass/method[1]": the second overload when several share the name path

With substring_matching, the last segment matches as a substring ("get" finds "getValue").
Use depth to include children (depth=1 lists the methods of a class) and include_body to
retrieve source code. Restrict the search with relative_path (file or directory)."#
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["name_path_pattern"],
            "properties": {
                "name_path_pattern": {
                    "type": "string",
                    "description": "Name path pattern to match"
                },
                "depth": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Levels of children to include (default: 0)"
                },
                "relative_path": {
                    "type": "string",
                    "description": "Restrict the search to this file or directory (default: whole project)"
                },
                "include_body": {
                    "type": "boolean",
                    "description": "Include the source code of matched symbols (default: false)"
                },
                "include_kinds": kinds_schema("include"),
                "exclude_kinds": kinds_schema("exclude; takes precedence over include_kinds"),
                "substring_matching": {
                    "type": "boolean",
                    "description": "Match the last name path segment as a substring (default: false)"
                },
                "max_answer_chars": max_answer_chars_schema()
            }
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult<ToolOutput> {
        let args: FindSymbolArgs = parse_args(args)?;
        let request = FindSymbolRequest::from(args);
        let output = ctx.run(self.ops.find_symbol(&request)).await?;
        Ok(
            ToolOutput::new(format!("Symbols matching {}", request.name_path_pattern), output)
                .with_metadata(json!({
                    "name_path_pattern": request.name_path_pattern,
                    "relative_path": request.relative_path,
                })),
        )
    }
}

/// Symbols that reference a given symbol.
pub struct FindReferencingSymbolsTool {
    ops: SymbolOperations,
}

impl FindReferencingSymbolsTool {
    pub fn new(ops: SymbolOperations) -> Self {
        Self { ops }
    }
}

#[derive(Debug, Deserialize)]
struct ReferencingArgs {
    name_path: String,
    relative_path: String,
    #[serde(default)]
    include_kinds: Vec<i64>,
    #[serde(default)]
    exclude_kinds: Vec<i64>,
    #[serde(default = "default_max_answer_chars")]
    max_answer_chars: i64,
}

#[async_trait]
impl Tool for FindReferencingSymbolsTool {
    fn id(&self) -> &str {
        "find_referencing_symbols"
    }

    fn description(&self) -> &str {
        "Finds the symbols that reference the symbol at name_path in relative_path. Each result carries \
a short snippet around the reference. Bodies of referencing symbols are not included."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["name_path", "relative_path"],
            "properties": {
                "name_path": {
                    "type": "string",
                    "description": "Name path of the referenced symbol (same syntax as find_symbol)"
                },
                "relative_path": {
                    "type": "string",
                    "description": "File containing the referenced symbol"
                },
                "include_kinds": kinds_schema("include for referencing symbols"),
                "exclude_kinds": kinds_schema("exclude for referencing symbols"),
                "max_answer_chars": max_answer_chars_schema()
            }
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult<ToolOutput> {
        let args: ReferencingArgs = parse_args(args)?;
        let output = ctx
            .run(self.ops.find_referencing_symbols(
                &args.name_path,
                &args.relative_path,
                &args.include_kinds,
                &args.exclude_kinds,
                args.max_answer_chars,
            ))
            .await?;
        Ok(ToolOutput::new(format!("References to {}", args.name_path), output)
            .with_metadata(json!({
                "name_path": args.name_path,
                "relative_path": args.relative_path,
            })))
    }
}
