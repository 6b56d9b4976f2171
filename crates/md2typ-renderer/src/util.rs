//! Shared text utilities for Typst output.

use pulldown_cmark::HeadingLevel;

/// Escape text for embedding inside a Typst string literal.
///
/// Every backslash and double quote is prefixed with one backslash. All other
/// characters, including raw newlines, pass through unchanged. Escaping is not
/// idempotent: escaping an escaped string doubles the backslashes again.
///
/// # Examples
///
/// ```
/// use md2typ_renderer::escape;
///
/// assert_eq!(escape(r#"say "hi""#), r#"say \"hi\""#);
/// assert_eq!(escape(r"C:\dir"), r"C:\\dir");
/// ```
#[must_use]
pub fn escape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || c == '"' {
            result.push('\\');
        }
        result.push(c);
    }
    result
}

/// Typst section marker for a heading of `level` shifted by `offset`.
///
/// A level-1 heading with offset 1 yields `=`, level 2 yields `==`.
#[must_use]
pub(crate) fn heading_marker(level: u8, offset: u8) -> String {
    let depth = usize::from(level.saturating_sub(1)) + usize::from(offset);
    "=".repeat(depth)
}

/// Convert heading level enum to number (1-6).
#[must_use]
pub(crate) fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Start a new line in `out` unless it is empty or already at a line start.
pub(crate) fn ensure_line_start(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain_text_unchanged() {
        assert_eq!(escape("hello world"), "hello world");
    }

    #[test]
    fn test_escape_quotes_and_backslashes() {
        assert_eq!(escape(r#"a "b" \c"#), r#"a \"b\" \\c"#);
    }

    #[test]
    fn test_escape_keeps_newlines() {
        assert_eq!(escape("line1\nline2"), "line1\nline2");
    }

    #[test]
    fn test_escape_leaves_no_bare_specials() {
        let escaped = escape(r#"x"y\z""#);
        let mut chars = escaped.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                let next = chars.next();
                assert!(matches!(next, Some('\\' | '"')), "dangling backslash");
            } else {
                assert_ne!(c, '"', "bare quote in {escaped}");
            }
        }
    }

    #[test]
    fn test_escape_is_not_idempotent() {
        let once = escape(r"\");
        assert_eq!(once, r"\\");
        assert_eq!(escape(&once), r"\\\\");
    }

    #[test]
    fn test_escape_multibyte() {
        assert_eq!(escape("표 \"1\""), "표 \\\"1\\\"");
    }

    #[test]
    fn test_heading_marker_offsets() {
        assert_eq!(heading_marker(1, 1), "=");
        assert_eq!(heading_marker(2, 1), "==");
        assert_eq!(heading_marker(1, 2), "==");
        assert_eq!(heading_marker(3, 0), "==");
    }

    #[test]
    fn test_heading_level_to_num() {
        assert_eq!(heading_level_to_num(HeadingLevel::H1), 1);
        assert_eq!(heading_level_to_num(HeadingLevel::H6), 6);
    }

    #[test]
    fn test_ensure_line_start() {
        let mut out = String::new();
        ensure_line_start(&mut out);
        assert_eq!(out, "");

        out.push_str("text");
        ensure_line_start(&mut out);
        assert_eq!(out, "text\n");

        ensure_line_start(&mut out);
        assert_eq!(out, "text\n");
    }
}
