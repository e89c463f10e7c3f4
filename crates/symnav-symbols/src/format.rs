//! Range formatting.

use lsp_types::Range;

/// Format a zero-based range as 1-based `L:C-L:C`.
pub fn format_range(range: &Range) -> String {
    format!(
        "{}:{}-{}:{}",
        range.start.line + 1,
        range.start.character + 1,
        range.end.line + 1,
        range.end.character + 1
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsp_types::Position;

    #[test]
    fn test_format_range() {
        let range = Range::new(Position::new(4, 0), Position::new(7, 12));
        assert_eq!(format_range(&range), "5:1-8:13");
    }

    #[test]
    fn test_format_empty_range() {
        let range = Range::new(Position::new(0, 0), Position::new(0, 0));
        assert_eq!(format_range(&range), "1:1-1:1");
    }
}
