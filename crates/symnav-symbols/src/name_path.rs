//! Name-path patterns and symbol queries.
//!
//! A name path addresses a symbol through its containers, e.g. `Foo/bar`.
//!
//! - `bar` matches any symbol named `bar`, at any depth.
//! - `Foo/bar` matches `bar` directly inside `Foo`, wherever `Foo` sits.
//! - `/Foo/bar` matches only when `Foo` is top-level.
//! - `Foo/bar[1]` selects the second of several same-named `bar`s.

use crate::error::{SymbolError, SymbolResult};
use crate::kind::{RawKind, SymbolKind};
use crate::symbol::{walk, Symbol};
use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;

/// A parsed name-path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePathPattern {
    segments: Vec<String>,
    absolute: bool,
    overload_idx: Option<usize>,
}

impl NamePathPattern {
    /// Parse a pattern, failing on empty input or empty segments.
    pub fn parse(pattern: &str) -> SymbolResult<Self> {
        let trimmed = pattern.trim();
        let invalid = |reason: &str| {
            SymbolError::invalid_argument(format!("Invalid name path '{pattern}': {reason}"))
        };

        let (absolute, rest) = match trimmed.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        if rest.is_empty() {
            return Err(invalid("empty pattern"));
        }

        let mut segments: Vec<String> = rest.split('/').map(str::to_string).collect();
        let mut overload_idx = None;
        if let Some(last) = segments.last_mut() {
            if let Some((open, idx)) = overload_suffix(last) {
                let idx = idx.map_err(|_| invalid("overload index is out of range"))?;
                overload_idx = Some(idx);
                last.truncate(open);
            }
        }

        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(invalid("empty segment"));
        }

        Ok(Self {
            segments,
            absolute,
            overload_idx,
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn overload_idx(&self) -> Option<usize> {
        self.overload_idx
    }

    /// The last segment, i.e. the name the pattern is looking for.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Match against a symbol's name path.
    ///
    /// With `substring` set, the last segment only needs to be contained in the
    /// symbol's name; all other segments must match exactly.
    pub fn matches(&self, name_path: &[String], overload_idx: Option<usize>, substring: bool) -> bool {
        let n = self.segments.len();
        if name_path.len() < n || (self.absolute && name_path.len() != n) {
            return false;
        }
        let tail = &name_path[name_path.len() - n..];
        let (Some((last_pattern, prefix_pattern)), Some((last, prefix))) =
            (self.segments.split_last(), tail.split_last())
        else {
            return false;
        };

        let last_matches = if substring {
            last.contains(last_pattern.as_str())
        } else {
            last == last_pattern
        };

        prefix == prefix_pattern
            && last_matches
            && self
                .overload_idx
                .map_or(true, |want| overload_idx.unwrap_or(0) == want)
    }

    pub fn matches_symbol(&self, symbol: &Symbol, substring: bool) -> bool {
        self.matches(&symbol.name_path, symbol.overload_idx, substring)
    }
}

/// A trailing `[digits]` overload index, with the byte offset of `[`.
/// Brackets holding anything else belong to the name, as in `operator[]`.
fn overload_suffix(segment: &str) -> Option<(usize, Result<usize, std::num::ParseIntError>)> {
    let inner = segment.strip_suffix(']')?;
    let open = inner.rfind('[')?;
    let digits = &inner[open + 1..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((open, digits.parse()))
}

impl FromStr for NamePathPattern {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for NamePathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str("/")?;
        }
        f.write_str(&self.segments.join("/"))?;
        if let Some(idx) = self.overload_idx {
            write!(f, "[{idx}]")?;
        }
        Ok(())
    }
}

/// Include/exclude filter over symbol kinds. Exclusion wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindFilter {
    include: Option<Vec<SymbolKind>>,
    exclude: Option<Vec<SymbolKind>>,
}

impl KindFilter {
    /// Build a filter from raw kind numbers, rejecting values outside 1..=26.
    pub fn from_values(include: &[i64], exclude: &[i64]) -> SymbolResult<Self> {
        Ok(Self {
            include: SymbolKind::parse_list(include)?,
            exclude: SymbolKind::parse_list(exclude)?,
        })
    }

    pub fn new(include: Option<Vec<SymbolKind>>, exclude: Option<Vec<SymbolKind>>) -> Self {
        Self { include, exclude }
    }

    pub fn accepts(&self, kind: RawKind) -> bool {
        let known = kind.known();
        if let (Some(exclude), Some(k)) = (&self.exclude, known) {
            if exclude.contains(&k) {
                return false;
            }
        }
        match &self.include {
            Some(include) => known.is_some_and(|k| include.contains(&k)),
            None => true,
        }
    }
}

/// Normalize a project-relative scope path: `.` components are dropped and
/// `..` folds into its parent. Absolute paths and paths leaving the project
/// root are rejected. The project root itself normalizes to `""`.
pub fn normalize_scope(scope: &str) -> SymbolResult<String> {
    let mut parts: Vec<&str> = Vec::new();
    for component in Path::new(scope).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(SymbolError::invalid_argument(format!(
                        "Path {scope} is outside the project."
                    )));
                }
            }
            Component::Normal(part) => parts.push(part.to_str().unwrap_or_default()),
            Component::RootDir | Component::Prefix(_) => {
                return Err(SymbolError::invalid_argument(format!(
                    "Expected a project-relative path, got {scope}."
                )));
            }
        }
    }
    Ok(parts.join("/"))
}

/// Whether a project-relative path lies within a scope (a file or directory).
/// A scope that cannot be normalized contains nothing.
pub fn path_in_scope(relative_path: &str, scope: &str) -> bool {
    let Ok(scope) = normalize_scope(scope) else {
        return false;
    };
    if scope.is_empty() {
        return true;
    }
    relative_path == scope
        || relative_path
            .strip_prefix(scope.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
}

/// A name-path lookup with its filters.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolQuery {
    pub pattern: NamePathPattern,
    pub kinds: KindFilter,
    pub substring_matching: bool,
    /// Restrict the search to a file or directory.
    pub within_path: Option<String>,
    pub include_body: bool,
}

impl SymbolQuery {
    pub fn new(pattern: NamePathPattern) -> Self {
        Self {
            pattern,
            kinds: KindFilter::default(),
            substring_matching: false,
            within_path: None,
            include_body: false,
        }
    }

    pub fn with_kinds(mut self, kinds: KindFilter) -> Self {
        self.kinds = kinds;
        self
    }

    pub fn with_substring_matching(mut self, substring: bool) -> Self {
        self.substring_matching = substring;
        self
    }

    pub fn within(mut self, path: Option<String>) -> Self {
        self.within_path = path.filter(|p| !p.is_empty());
        self
    }

    pub fn with_body(mut self, include_body: bool) -> Self {
        self.include_body = include_body;
        self
    }

    /// Whether a file is searched at all.
    pub fn in_scope(&self, relative_path: &str) -> bool {
        self.within_path
            .as_deref()
            .map_or(true, |scope| path_in_scope(relative_path, scope))
    }

    pub fn accepts(&self, symbol: &Symbol) -> bool {
        self.pattern.matches_symbol(symbol, self.substring_matching)
            && self.kinds.accepts(symbol.kind)
    }

    /// Matching symbols of one file's tree, in document order.
    pub fn select<'a>(&self, roots: &'a [Symbol]) -> Vec<&'a Symbol> {
        walk(roots).into_iter().filter(|s| self.accepts(s)).collect()
    }
}
