//! Machine-safe identifier derivation from the display name.

/// Identifier used when the display name sanitizes to fewer than two characters.
pub const DEFAULT_IDENTIFIER: &str = "installer-package";

/// Derive a machine-safe identifier from a human-facing application name.
///
/// Non-ASCII characters are dropped, whitespace runs collapse to a single
/// `-`, anything outside `[A-Za-z0-9-]` is removed, the result is lowercased
/// and stripped of leading/trailing dashes. Results shorter than two
/// characters fall back to [`DEFAULT_IDENTIFIER`].
///
/// The function is idempotent: `sanitize_identifier(&sanitize_identifier(x))`
/// equals `sanitize_identifier(x)`.
pub fn sanitize_identifier(name: &str) -> String {
    let mut collapsed = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for c in name.chars().filter(char::is_ascii) {
        if c.is_ascii_whitespace() {
            if !in_whitespace {
                collapsed.push('-');
                in_whitespace = true;
            }
        } else {
            collapsed.push(c);
            in_whitespace = false;
        }
    }

    let cleaned: String = collapsed
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let trimmed = cleaned.trim_matches('-');

    if trimmed.len() < 2 {
        DEFAULT_IDENTIFIER.to_string()
    } else {
        trimmed.to_string()
    }
}
