//! Answer length limiting.

/// Sentinel for "use the configured default budget".
pub const USE_DEFAULT_MAX_CHARS: i64 = -1;

/// Budget used when nothing else is configured.
pub const DEFAULT_MAX_ANSWER_CHARS: usize = 150_000;

/// Returned in place of an answer that exceeds its budget.
pub const ANSWER_TOO_LONG: &str = "The answer is too long. Please try a more specific query \
     or raise the max_answer_chars parameter.";

/// Resolve a requested budget; any negative value selects `default`.
pub fn effective_limit(requested: i64, default: usize) -> usize {
    usize::try_from(requested).unwrap_or(default)
}

/// Return `content` unchanged if it fits in `max_chars` characters, otherwise
/// the fixed too-long notice.
pub fn limit_length(content: String, max_chars: usize) -> String {
    if content.chars().count() > max_chars {
        ANSWER_TOO_LONG.to_string()
    } else {
        content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_limit() {
        assert_eq!(effective_limit(-1, 500), 500);
        assert_eq!(effective_limit(-7, 500), 500);
        assert_eq!(effective_limit(0, 500), 0);
        assert_eq!(effective_limit(20, 500), 20);
    }

    #[test]
    fn test_limit_length() {
        assert_eq!(limit_length("abc".into(), 3), "abc");
        assert_eq!(limit_length("abcd".into(), 3), ANSWER_TOO_LONG);
        assert_eq!(limit_length(String::new(), 0), "");
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        assert_eq!(limit_length("äöü".into(), 3), "äöü");
    }
}
