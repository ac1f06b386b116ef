//! Escaping for every target syntax an artifact embeds values into.

use super::error::Result;
use serde::Serialize;

/// Serialize `value` as a JSON literal that is also safe inside an HTML
/// `<script>` element and a JavaScript source file.
pub fn json_literal<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)?;
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    Ok(out)
}

/// Escape text for an HTML text node or quoted attribute.
pub fn html_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Pascal Script string expression for `value`.
///
/// Single quotes are doubled and line breaks become `#13#10` concatenations.
/// `{#` is split so the preprocessor never sees an inline directive.
pub fn pascal_string(value: &str) -> String {
    let normalized = value.replace("\r\n", "\n").replace('\r', "\n");
    normalized
        .split('\n')
        .map(|line| format!("'{}'", line.replace('\'', "''").replace("{#", "{' + '#")))
        .collect::<Vec<_>>()
        .join(" + #13#10 + ")
}

/// Value for a `[Setup]` directive: single line, braces escaped.
pub fn directive_value(value: &str) -> String {
    value
        .replace(['\r', '\n'], " ")
        .replace('{', "{{")
        .trim()
        .to_string()
}

/// Value inside a double-quoted parameter of an entry section line.
pub fn entry_string(value: &str) -> String {
    value.replace('"', "\"\"").replace('{', "{{")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_literal_cannot_close_script_element() {
        let lit = json_literal("</script><script>alert(1)</script>").unwrap();
        assert!(!lit.contains("</script"));
        let back: String = serde_json::from_str(&lit).unwrap();
        assert_eq!(back, "</script><script>alert(1)</script>");
    }

    #[test]
    fn json_literal_escapes_line_separators() {
        let lit = json_literal("a\u{2028}b").unwrap();
        assert_eq!(lit, "\"a\\u2028b\"");
    }

    #[test]
    fn html_text_escapes_markup() {
        assert_eq!(html_text("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
    }

    #[test]
    fn pascal_string_doubles_quotes_and_splits_lines() {
        assert_eq!(pascal_string("it's"), "'it''s'");
        assert_eq!(pascal_string("a\r\nb"), "'a' + #13#10 + 'b'");
        assert_eq!(pascal_string(""), "''");
    }

    #[test]
    fn pascal_string_splits_preprocessor_braces() {
        assert_eq!(pascal_string("{#x}"), "'{' + '#x}'");
    }

    #[test]
    fn directive_value_is_single_line() {
        assert_eq!(directive_value("Acme {Beta}\nLine"), "Acme {{Beta} Line");
    }

    #[test]
    fn entry_string_doubles_quotes() {
        assert_eq!(entry_string("say \"hi\""), "say \"\"hi\"\"");
    }
}
