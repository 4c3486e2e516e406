//! Small helpers for timestamps, string shaping and the file system.

use chrono::Local;
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

/// Current local time as an RFC 3339 string.
///
/// Used for `published` when a source gives no date, for
/// `processed_at` in the history and for webhook timestamps.
pub fn now_iso() -> String {
    Local::now().to_rfc3339()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with `"…(+N chars)"` appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let total = s.chars().count();
    if total <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}…(+{} chars)", head, total - max)
    }
}

/// Cut `text` to at most `max` characters, appending `"..."` when anything
/// was dropped.
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Make sure the parent directory of `path` exists.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).await?;
            debug!(dir = %dir.display(), "Parent directory ready");
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 chars)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        let s = "번역".repeat(10);
        let result = truncate_for_log(&s, 3);
        assert!(result.starts_with("번역번"));
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("short", 500), "short");
        let exact = "x".repeat(500);
        assert_eq!(truncate_with_ellipsis(&exact, 500), exact);

        let long = "y".repeat(501);
        let cut = truncate_with_ellipsis(&long, 500);
        assert_eq!(cut.len(), 503);
        assert!(cut.ends_with("y..."));
    }

    #[test]
    fn test_truncate_with_ellipsis_counts_chars() {
        let long = "가".repeat(600);
        let cut = truncate_with_ellipsis(&long, 500);
        assert_eq!(cut.chars().count(), 503);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b   c "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_now_iso_is_rfc3339() {
        let now = now_iso();
        assert!(chrono::DateTime::parse_from_rfc3339(&now).is_ok());
    }

    #[tokio::test]
    async fn test_ensure_parent_dir_creates_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a/b/history.json");
        ensure_parent_dir(&path).await.unwrap();
        assert!(tmp.path().join("a/b").is_dir());
    }
}
