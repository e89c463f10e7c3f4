//! The symbol model.

use crate::kind::RawKind;
use lsp_types::{Position, Range};
use std::collections::HashMap;

/// Where a symbol lives in the project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolLocation {
    /// Project-relative path of the containing file.
    pub relative_path: Option<String>,
    /// Range reported for the location (usually the selection range).
    pub range: Option<Range>,
}

/// A named code entity with its position and nested children.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    /// Names from the outermost container down to this symbol.
    pub name_path: Vec<String>,
    pub kind: RawKind,
    /// Full extent of the symbol, body included.
    pub range: Option<Range>,
    /// Extent of the identifier.
    pub selection_range: Option<Range>,
    pub location: SymbolLocation,
    pub body: Option<String>,
    /// Index among same-named siblings, set only when a name path is ambiguous.
    pub overload_idx: Option<usize>,
    pub children: Vec<Symbol>,
}

impl Symbol {
    /// Create a symbol with the given name path. The name is its last segment.
    pub fn new(name_path: Vec<String>, kind: impl Into<RawKind>) -> Self {
        let name = name_path.last().cloned().unwrap_or_default();
        Self {
            name,
            name_path,
            kind: kind.into(),
            range: None,
            selection_range: None,
            location: SymbolLocation::default(),
            body: None,
            overload_idx: None,
            children: Vec::new(),
        }
    }

    /// The name path joined with `/`, with the overload index appended as `[i]`.
    pub fn name_path_string(&self) -> String {
        let joined = self.name_path.join("/");
        match self.overload_idx {
            Some(idx) => format!("{joined}[{idx}]"),
            None => joined,
        }
    }

    pub fn relative_path(&self) -> Option<&str> {
        self.location.relative_path.as_deref()
    }

    /// Position to place the cursor at when issuing positional requests for this symbol.
    pub fn identifier_position(&self) -> Option<Position> {
        self.selection_range
            .or(self.location.range)
            .or(self.range)
            .map(|r| r.start)
    }

    /// Whether `position` falls within the symbol's full range. The end is
    /// exclusive, except for an empty range which contains its start.
    pub fn contains(&self, position: Position) -> bool {
        self.range.is_some_and(|r| {
            r.start <= position && (position < r.end || (r.start == r.end && position == r.start))
        })
    }

    /// Preorder traversal of this symbol and its descendants.
    pub fn descendants(&self) -> Vec<&Symbol> {
        let mut out = Vec::new();
        collect(self, &mut out);
        out
    }
}

fn collect<'a>(symbol: &'a Symbol, out: &mut Vec<&'a Symbol>) {
    out.push(symbol);
    for child in &symbol.children {
        collect(child, out);
    }
}

/// Preorder traversal of a forest of symbols.
pub fn walk(roots: &[Symbol]) -> Vec<&Symbol> {
    let mut out = Vec::new();
    for root in roots {
        collect(root, &mut out);
    }
    out
}

/// Number symbols that share a name path within one file.
///
/// Symbols with a unique name path keep `overload_idx == None`; duplicates are
/// numbered from 0 in document order.
pub fn assign_overload_indices(roots: &mut [Symbol]) {
    let mut counts: HashMap<Vec<String>, usize> = HashMap::new();
    for symbol in walk(roots) {
        *counts.entry(symbol.name_path.clone()).or_default() += 1;
    }
    let mut next: HashMap<Vec<String>, usize> = HashMap::new();
    for root in roots.iter_mut() {
        number(root, &counts, &mut next);
    }
}

fn number(
    symbol: &mut Symbol,
    counts: &HashMap<Vec<String>, usize>,
    next: &mut HashMap<Vec<String>, usize>,
) {
    if counts.get(&symbol.name_path).copied().unwrap_or(0) > 1 {
        let idx = next.entry(symbol.name_path.clone()).or_default();
        symbol.overload_idx = Some(*idx);
        *idx += 1;
    } else {
        symbol.overload_idx = None;
    }
    for child in &mut symbol.children {
        number(child, counts, next);
    }
}

/// The innermost symbol whose range contains `position`.
pub fn smallest_enclosing(roots: &[Symbol], position: Position) -> Option<&Symbol> {
    let outer = roots.iter().find(|s| s.contains(position))?;
    Some(smallest_enclosing(&outer.children, position).unwrap_or(outer))
}

/// A symbol that contains a reference to some other symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceInSymbol {
    pub symbol: Symbol,
    /// Zero-based line of the reference.
    pub line: u32,
    /// Zero-based UTF-16 column of the reference.
    pub character: u32,
}
