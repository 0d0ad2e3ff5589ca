use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder the scheduler writes in place of an embedded newline.
pub const LINE_BREAK_PLACEHOLDER: char = ';';

static RE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*#").unwrap());

/// Restores the newlines the scheduler collapsed into `;` to keep each job on
/// one output row.
///
/// No escaping exists upstream, so a command that genuinely contained `;`
/// comes back split across lines. That loss happens before the text reaches
/// us and cannot be undone here.
pub fn reverse_line_breaks(text: &str) -> String {
    text.replace(LINE_BREAK_PLACEHOLDER, "\n")
}

/// Drops every line that starts with `#` after optional leading whitespace.
/// Everything else, blank lines included, is kept in order.
pub fn strip_comments(text: &str) -> String {
    text.lines()
        .filter(|line| !RE_COMMENT.is_match(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Both passes in the only valid order: a comment marker can only start a
/// line once the line breaks are back.
pub fn sanitize(text: &str) -> String {
    strip_comments(&reverse_line_breaks(text))
}
