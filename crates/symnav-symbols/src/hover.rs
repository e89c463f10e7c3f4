//! Hover result normalization.

use serde::Deserialize;
use serde_json::Value;

pub const NO_HOVER_INFO: &str = "No hover information available.";
pub const NO_HOVER_CONTENT: &str = "No content in hover result.";

/// A `{ value }` hover entry (`MarkedString` or `MarkupContent`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MarkedValue {
    pub value: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum HoverPart {
    Text(String),
    Marked(MarkedValue),
    Other(Value),
}

impl HoverPart {
    fn text(&self) -> String {
        match self {
            HoverPart::Text(text) => text.clone(),
            HoverPart::Marked(marked) => marked.value.clone(),
            HoverPart::Other(value) => value.to_string(),
        }
    }
}

/// The shapes a hover's `contents` may take.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum HoverContents {
    Text(String),
    Marked(MarkedValue),
    List(Vec<HoverPart>),
    Other(Value),
}

impl HoverContents {
    /// Flatten to text; list entries are separated by a blank line.
    pub fn normalize(&self) -> String {
        match self {
            HoverContents::Text(text) => text.clone(),
            HoverContents::Marked(marked) => marked.value.clone(),
            HoverContents::List(parts) => parts
                .iter()
                .map(HoverPart::text)
                .collect::<Vec<_>>()
                .join("\n\n"),
            HoverContents::Other(value) => value.to_string(),
        }
    }
}

fn is_empty(contents: &Value) -> bool {
    match contents {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Text for a raw hover result.
pub fn hover_text(raw: Option<&Value>) -> String {
    let Some(raw) = raw.filter(|v| !v.is_null()) else {
        return NO_HOVER_INFO.to_string();
    };
    let contents = raw.get("contents").unwrap_or(&Value::Null);
    if is_empty(contents) {
        return NO_HOVER_CONTENT.to_string();
    }
    match HoverContents::deserialize(contents) {
        Ok(parsed) => parsed.normalize(),
        Err(_) => contents.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_string() {
        assert_eq!(hover_text(Some(&json!({"contents": "fn a()"}))), "fn a()");
    }

    #[test]
    fn test_structured() {
        assert_eq!(hover_text(Some(&json!({"contents": {"value": "x"}}))), "x");
        assert_eq!(
            hover_text(Some(&json!({"contents": {"kind": "markdown", "value": "**x**"}}))),
            "**x**"
        );
    }

    #[test]
    fn test_list() {
        let raw = json!({"contents": ["a", {"language": "rust", "value": "b"}]});
        assert_eq!(hover_text(Some(&raw)), "a\n\nb");
    }

    #[test]
    fn test_unrecognized_shape_is_stringified() {
        let raw = json!({"contents": {"text": "odd"}});
        assert_eq!(hover_text(Some(&raw)), r#"{"text":"odd"}"#);
    }

    #[test]
    fn test_missing_and_empty() {
        assert_eq!(hover_text(None), NO_HOVER_INFO);
        assert_eq!(hover_text(Some(&Value::Null)), NO_HOVER_INFO);
        assert_eq!(hover_text(Some(&json!({"contents": ""}))), NO_HOVER_CONTENT);
        assert_eq!(hover_text(Some(&json!({"contents": []}))), NO_HOVER_CONTENT);
        assert_eq!(hover_text(Some(&json!({}))), NO_HOVER_CONTENT);
    }
}
