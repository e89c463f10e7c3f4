//! Reduction of symbols to their serializable form.

use crate::format::format_range;
use crate::symbol::Symbol;
use serde::{Deserialize, Serialize};

/// A symbol stripped down to what callers see.
///
/// Location ranges, selection ranges and raw kind numbers are dropped; the
/// full range is kept as a formatted string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizedSymbol {
    pub name_path: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SanitizedSymbol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_around_reference: Option<String>,
}

/// How much of a symbol tree to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeOptions {
    /// Levels of children to keep; 0 keeps none.
    pub depth: usize,
    pub include_body: bool,
}

impl SanitizeOptions {
    pub fn new(depth: usize, include_body: bool) -> Self {
        Self {
            depth,
            include_body,
        }
    }

    /// Keep the whole tree.
    pub fn full(include_body: bool) -> Self {
        Self::new(usize::MAX, include_body)
    }
}

impl Symbol {
    pub fn sanitize(&self, options: SanitizeOptions) -> SanitizedSymbol {
        let children = if options.depth == 0 {
            Vec::new()
        } else {
            let child_options = SanitizeOptions::new(options.depth - 1, options.include_body);
            self.children
                .iter()
                .map(|c| c.sanitize(child_options))
                .collect()
        };

        SanitizedSymbol {
            name_path: self.name_path_string(),
            kind: self.kind.label(),
            relative_path: self.location.relative_path.clone(),
            range: self.range.as_ref().map(format_range),
            body: if options.include_body {
                self.body.as_deref().map(normalize_body)
            } else {
                None
            },
            children,
            content_around_reference: None,
        }
    }
}

impl SanitizedSymbol {
    /// Sanitizing an already sanitized symbol only re-normalizes bodies.
    pub fn sanitize(mut self) -> Self {
        self.body = self.body.as_deref().map(normalize_body);
        self.children = self.children.into_iter().map(Self::sanitize).collect();
        self
    }

    pub fn with_content_around_reference(mut self, content: impl Into<String>) -> Self {
        self.content_around_reference = Some(content.into());
        self
    }
}

/// Strip leading whitespace from the first line and dedent the rest.
///
/// The first line of a body starts at the symbol's column, so its indentation
/// is already gone; the remaining lines keep theirs relative to each other.
pub fn normalize_body(body: &str) -> String {
    let mut lines = body.lines();
    let first = lines.next().unwrap_or_default().trim_start();
    let rest: Vec<&str> = lines.collect();
    if rest.is_empty() {
        return first.to_string();
    }
    let mut out = String::from(first);
    out.push('\n');
    out.push_str(&dedent(&rest));
    out
}

fn dedent(lines: &[&str]) -> String {
    let indents = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| &l[..l.len() - l.trim_start().len()]);

    let mut common: Option<&str> = None;
    for indent in indents {
        common = Some(match common {
            None => indent,
            Some(prefix) => common_prefix(prefix, indent),
        });
    }
    let common = common.unwrap_or_default();

    lines
        .iter()
        .map(|l| {
            if l.trim().is_empty() {
                ""
            } else {
                l.strip_prefix(common).unwrap_or(l)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .char_indices()
        .zip(b.chars())
        .take_while(|((_, x), y)| x == y)
        .last()
        .map(|((i, c), _)| i + c.len_utf8())
        .unwrap_or(0);
    &a[..len]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{RawKind, SymbolKind};
    use lsp_types::{Position, Range};

    fn class_with_method() -> Symbol {
        let mut method = Symbol::new(vec!["Foo".into(), "bar".into()], SymbolKind::Method);
        method.range = Some(Range::new(Position::new(1, 4), Position::new(2, 12)));
        method.body = Some("def bar(self):\n        return 1".into());
        method.location.relative_path = Some("pkg/foo.py".into());

        let mut class = Symbol::new(vec!["Foo".into()], SymbolKind::Class);
        class.range = Some(Range::new(Position::new(0, 0), Position::new(2, 12)));
        class.selection_range = Some(Range::new(Position::new(0, 6), Position::new(0, 9)));
        class.location = crate::symbol::SymbolLocation {
            relative_path: Some("pkg/foo.py".into()),
            range: class.selection_range,
        };
        class.body = Some("class Foo:\n    def bar(self):\n        return 1".into());
        class.children = vec![method];
        class
    }

    #[test]
    fn test_sanitize_drops_location_range_and_formats_range() {
        let out = class_with_method().sanitize(SanitizeOptions::new(0, false));
        assert_eq!(out.name_path, "Foo");
        assert_eq!(out.kind, "Class");
        assert_eq!(out.relative_path.as_deref(), Some("pkg/foo.py"));
        assert_eq!(out.range.as_deref(), Some("1:1-3:13"));
        assert!(out.body.is_none());
        assert!(out.children.is_empty());
    }

    #[test]
    fn test_sanitize_depth_and_body() {
        let out = class_with_method().sanitize(SanitizeOptions::new(1, true));
        assert_eq!(out.children.len(), 1);
        assert_eq!(out.children[0].name_path, "Foo/bar");
        assert_eq!(
            out.children[0].body.as_deref(),
            Some("def bar(self):\nreturn 1")
        );
        assert_eq!(
            out.body.as_deref(),
            Some("class Foo:\ndef bar(self):\n    return 1")
        );
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = class_with_method().sanitize(SanitizeOptions::full(true));
        let twice = once.clone().sanitize();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unknown_kind_uses_number() {
        let s = Symbol::new(vec!["x".into()], RawKind(99));
        assert_eq!(s.sanitize(SanitizeOptions::new(0, false)).kind, "99");
    }

    #[test]
    fn test_serialization_skips_empty_fields() {
        let s = Symbol::new(vec!["x".into()], SymbolKind::Variable);
        let json = serde_json::to_value(s.sanitize(SanitizeOptions::new(0, false))).unwrap();
        assert_eq!(json, serde_json::json!({"name_path": "x", "kind": "Variable"}));
    }

    #[test]
    fn test_normalize_body() {
        assert_eq!(normalize_body("   fn a() {}"), "fn a() {}");
        assert_eq!(
            normalize_body("fn a() {\n        x();\n\n        y();\n    }"),
            "fn a() {\n    x();\n\n    y();\n}"
        );
        assert_eq!(normalize_body(""), "");
    }
}
