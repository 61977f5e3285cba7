//! Bounded summaries of decode/encode failures for logs and [`ParseError`](crate::ParseError) messages.

use serde_json::error::Category;

/// Maximum number of issues listed in a summary.
pub(crate) const MAX_ISSUES: usize = 3;
/// Maximum summary length (characters) before it is cut with `...`.
pub(crate) const MAX_SUMMARY_LEN: usize = 240;

/// Joins the first [`MAX_ISSUES`] issues, notes how many were left out, and caps the length.
pub(crate) fn summarize_issues<I, S>(issues: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let issues: Vec<S> = issues.into_iter().collect();
    if issues.is_empty() {
        return "unknown validation error".to_string();
    }
    let head = issues
        .iter()
        .take(MAX_ISSUES)
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("; ");
    let summary = match issues.len().saturating_sub(MAX_ISSUES) {
        0 => head,
        n => format!("{head} (+{n} more)"),
    };
    truncate(&summary, MAX_SUMMARY_LEN)
}

/// Summarizes a `serde_json` failure (which reports the first issue only).
pub(crate) fn summarize_json_error(error: &serde_json::Error) -> String {
    let class = match error.classify() {
        Category::Syntax | Category::Eof => "invalid JSON",
        Category::Data => "schema mismatch",
        Category::Io => "read failure",
    };
    summarize_issues([format!("{class}: {error}")])
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut cut: String = s.chars().take(max).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_at_most_three_issues() {
        let s = summarize_issues(["a", "b", "c", "d", "e"]);
        assert_eq!(s, "a; b; c (+2 more)");
    }

    #[test]
    fn caps_length() {
        let long = "x".repeat(500);
        let s = summarize_issues([long]);
        assert_eq!(s.chars().count(), MAX_SUMMARY_LEN + 3);
        assert!(s.ends_with("..."));
    }

    #[test]
    fn empty_issue_list() {
        assert_eq!(summarize_issues(Vec::<String>::new()), "unknown validation error");
    }

    #[test]
    fn json_errors_are_classified() {
        let err = serde_json::from_str::<serde_json::Value>("not json").expect_err("invalid");
        assert!(summarize_json_error(&err).starts_with("invalid JSON"));
    }
}
