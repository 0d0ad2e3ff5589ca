use once_cell::sync::Lazy;
use regex::Regex;

// Anything outside [A-Za-z0-9_-${}] breaks a token.
static RE_WORD_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\-$\{\}]+").unwrap());

/// Splits sanitized command text into tokens.
///
/// Fragments made only of symbols (`--`, `${}`) are dropped; anything with at
/// least one ASCII letter or digit survives. Order and repeats are preserved
/// because repeats carry weight in the distribution.
pub fn tokenize(text: &str) -> Vec<&str> {
    RE_WORD_BREAK
        .split(text)
        .filter(|fragment| fragment.bytes().any(|b| b.is_ascii_alphanumeric()))
        .collect()
}
