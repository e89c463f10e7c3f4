//! Builder patterns for constructing test objects.

use symnav_symbols::{Position, Range, RawKind, RawLocation, Symbol, SymbolLocation};

/// Zero-based range shorthand.
pub fn range(start_line: u32, start_char: u32, end_line: u32, end_char: u32) -> Range {
    Range::new(
        Position::new(start_line, start_char),
        Position::new(end_line, end_char),
    )
}

/// A raw location with a project-relative path.
pub fn raw_location(relative_path: &str, line: u32, start: u32, end: u32) -> RawLocation {
    RawLocation {
        uri: format!("file:///project/{relative_path}"),
        absolute_path: None,
        relative_path: Some(relative_path.to_string()),
        range: Some(range(line, start, line, end)),
    }
}

/// Builder for symbol trees.
///
/// Children inherit their parent's name path and file.
///
/// # Example
///
/// ```rust
/// use symnav_symbols::SymbolKind;
/// use symnav_test_utils::builders::SymbolBuilder;
///
/// let class = SymbolBuilder::new("Foo", SymbolKind::Class)
///     .file("foo.py")
///     .range(0, 0, 4, 0)
///     .child(SymbolBuilder::new("bar", SymbolKind::Method).range(1, 4, 2, 0))
///     .build();
///
/// assert_eq!(class.children[0].name_path, vec!["Foo", "bar"]);
/// assert_eq!(class.children[0].relative_path(), Some("foo.py"));
/// ```
#[derive(Debug, Clone)]
pub struct SymbolBuilder {
    name: String,
    kind: RawKind,
    range: Option<Range>,
    selection_range: Option<Range>,
    relative_path: Option<String>,
    body: Option<String>,
    overload_idx: Option<usize>,
    children: Vec<SymbolBuilder>,
}

impl SymbolBuilder {
    pub fn new(name: &str, kind: impl Into<RawKind>) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.into(),
            range: None,
            selection_range: None,
            relative_path: None,
            body: None,
            overload_idx: None,
            children: Vec::new(),
        }
    }

    pub fn range(mut self, start_line: u32, start_char: u32, end_line: u32, end_char: u32) -> Self {
        self.range = Some(range(start_line, start_char, end_line, end_char));
        self
    }

    pub fn selection(mut self, line: u32, start: u32, end: u32) -> Self {
        self.selection_range = Some(range(line, start, line, end));
        self
    }

    pub fn file(mut self, relative_path: &str) -> Self {
        self.relative_path = Some(relative_path.to_string());
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }

    pub fn overload(mut self, idx: usize) -> Self {
        self.overload_idx = Some(idx);
        self
    }

    pub fn child(mut self, child: SymbolBuilder) -> Self {
        self.children.push(child);
        self
    }

    pub fn build(self) -> Symbol {
        self.build_under(&[], None)
    }

    fn build_under(self, parent: &[String], parent_file: Option<&str>) -> Symbol {
        let mut name_path = parent.to_vec();
        name_path.push(self.name.clone());
        let relative_path = self
            .relative_path
            .or_else(|| parent_file.map(str::to_string));

        let children = self
            .children
            .into_iter()
            .map(|c| c.build_under(&name_path, relative_path.as_deref()))
            .collect();

        Symbol {
            name: self.name,
            kind: self.kind,
            range: self.range,
            selection_range: self.selection_range,
            location: SymbolLocation {
                range: self.selection_range.or(self.range),
                relative_path,
            },
            body: self.body,
            overload_idx: self.overload_idx,
            children,
            name_path,
        }
    }
}
