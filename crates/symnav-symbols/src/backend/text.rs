//! LSP positions over source text.
//!
//! Positions count UTF-16 code units within a line. Positions past the end of
//! a line clamp to the line end, lines past the end of the text clamp to the
//! end of the text.

use lsp_types::{Position, Range, TextEdit};

/// Byte offset of `position` in `source`.
pub fn byte_offset(source: &str, position: Position) -> usize {
    let mut offset = 0usize;
    let mut lines = source.split('\n');
    for _ in 0..position.line {
        match lines.next() {
            Some(line) => offset += line.len() + 1,
            None => return source.len(),
        }
    }
    let Some(line) = lines.next() else {
        return source.len();
    };

    let mut utf16 = 0u32;
    let mut column = 0usize;
    for ch in line.chars() {
        if utf16 >= position.character {
            break;
        }
        utf16 += ch.len_utf16() as u32;
        column += ch.len_utf8();
    }
    (offset + column).min(source.len())
}

/// Byte offset at which zero-based `line` starts.
pub fn line_start(source: &str, line: u32) -> usize {
    byte_offset(source, Position::new(line, 0))
}

pub fn slice<'a>(source: &'a str, range: &Range) -> &'a str {
    let start = byte_offset(source, range.start);
    let end = byte_offset(source, range.end).max(start);
    &source[start..end]
}

/// Where an insertion goes relative to a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// On the symbol's first line, pushing the symbol down.
    Before,
    /// On the line after the symbol.
    After,
}

/// Byte offset at which whole lines are inserted next to a symbol spanning
/// `range`. A range ending at column 0 of a later line ends on the line before.
pub fn insertion_offset(source: &str, range: &Range, side: Side) -> usize {
    match side {
        Side::Before => line_start(source, range.start.line),
        Side::After if range.end.character == 0 && range.end.line > range.start.line => {
            line_start(source, range.end.line)
        }
        Side::After => line_start(source, range.end.line + 1),
    }
}

/// Insert `content` as whole lines next to the symbol spanning `range`.
pub fn insert_lines(source: &str, range: &Range, side: Side, content: &str) -> String {
    let at = insertion_offset(source, range, side);
    let mut block = String::with_capacity(content.len() + 2);
    if at == source.len() && !source.is_empty() && !source.ends_with('\n') {
        block.push('\n');
    }
    block.push_str(content);
    if !content.ends_with('\n') {
        block.push('\n');
    }

    let mut out = source.to_string();
    out.insert_str(at, &block);
    out
}

/// Replace the text spanned by `range` with `content`.
pub fn replace_range(source: &str, range: &Range, content: &str) -> String {
    let start = byte_offset(source, range.start);
    let end = byte_offset(source, range.end).max(start);
    let mut out = source.to_string();
    out.replace_range(start..end, content);
    out
}

/// Apply edits to `source`. Edits must not overlap; they are applied from the
/// end of the text backwards so earlier offsets stay valid.
pub fn apply_edits(source: &str, edits: &[TextEdit]) -> String {
    let mut resolved: Vec<(usize, usize, &str)> = edits
        .iter()
        .map(|e| {
            let start = byte_offset(source, e.range.start);
            let end = byte_offset(source, e.range.end).max(start);
            (start, end, e.new_text.as_str())
        })
        .collect();
    resolved.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));

    let mut out = source.to_string();
    for (start, end, text) in resolved {
        out.replace_range(start..end, text);
    }
    out
}
