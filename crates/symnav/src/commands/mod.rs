//! Command implementations.

pub mod logging;
pub mod serve;

use serde_json::{json, Value};
use symnav_tools::{Tool, ToolRegistry};

pub use logging::init_logging;

/// One line per tool: id and the first line of its description.
pub fn tool_summary(registry: &ToolRegistry) -> String {
    registry
        .list()
        .into_iter()
        .filter_map(|id| registry.get(id))
        .map(|tool| {
            let first = tool.description().lines().next().unwrap_or_default();
            format!("{:<26} {}", tool.id(), first)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Every tool with its description and parameter schema.
pub fn tool_schemas(registry: &ToolRegistry) -> Value {
    Value::Array(
        registry
            .list()
            .into_iter()
            .filter_map(|id| registry.get(id))
            .map(|tool| {
                json!({
                    "name": tool.id(),
                    "description": tool.description(),
                    "parameters": tool.parameters_schema(),
                })
            })
            .collect(),
    )
}
