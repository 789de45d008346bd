//! Logical path normalization.
//!
//! Logical paths name files across nesting levels (`a.zip/dir/b.7z/y.txt`).
//! They always use `/` regardless of platform; backslashes supplied by
//! callers are treated as separators too.

/// Splits a logical path into its normalized segments.
///
/// Surrounding whitespace is trimmed, empty and `.` segments are dropped and
/// `..` removes the previous segment. A degenerate path yields no segments.
///
/// # Examples
///
/// ```
/// use nestarc_core::path::segments;
///
/// assert_eq!(segments(" a.zip\\dir/./b.7z "), vec!["a.zip", "dir", "b.7z"]);
/// assert_eq!(segments("a.zip/dir/../x.txt"), vec!["a.zip", "x.txt"]);
/// assert!(segments(" . ").is_empty());
/// ```
pub fn segments(path: &str) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for segment in path.trim().split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Returns the normalized, slash-joined form of a logical path.
pub fn normalize(path: &str) -> String {
    segments(path).join("/")
}

/// Joins a parent logical path with a (possibly multi-segment) child name.
pub fn join(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        return normalize(child);
    }
    normalize(&format!("{parent}/{child}"))
}

/// Returns the last segment of a logical path, or `""` for a degenerate one.
pub fn base_name(path: &str) -> &str {
    segments(path).last().copied().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_basic() {
        assert_eq!(segments("a.zip/b.7z/y.txt"), vec!["a.zip", "b.7z", "y.txt"]);
    }

    #[test]
    fn test_segments_degenerate() {
        assert!(segments("").is_empty());
        assert!(segments("   ").is_empty());
        assert!(segments("./").is_empty());
        assert!(segments("a/..").is_empty());
    }

    #[test]
    fn test_segments_leading_parent_dropped() {
        assert_eq!(segments("../a.zip"), vec!["a.zip"]);
    }

    #[test]
    fn test_normalize_backslashes() {
        assert_eq!(normalize("a.zip\\sub\\b.7z"), "a.zip/sub/b.7z");
        assert_eq!(normalize("/a.zip//x/"), "a.zip/x");
    }

    #[test]
    fn test_join() {
        assert_eq!(join("a.zip", "dir/b.7z"), "a.zip/dir/b.7z");
        assert_eq!(join("", "x.txt"), "x.txt");
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("/tmp/upload/a.zip"), "a.zip");
        assert_eq!(base_name("."), "");
    }
}
