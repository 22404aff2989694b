//! Shared utility functions for rendering.

use std::borrow::Cow;
use std::sync::LazyLock;

use pulldown_cmark::HeadingLevel;
use regex::Regex;

/// Numeric character references; browsers accept them without the trailing `;`.
static NUMERIC_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&#(?:[xX]([0-9a-fA-F]+)|([0-9]+));?").expect("valid numeric reference regex")
});

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
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

/// Extract the lowercase scheme of a URL-ish attribute value.
///
/// Entities are decoded and ASCII whitespace/control characters removed first,
/// mirroring how browsers normalize `href` values before resolving them, so
/// `jav&#x09;ascript:` and ` JAVASCRIPT:` both report `javascript`.
/// Numeric references are decoded with or without their `;`. A prefix that
/// still holds a `&` before any path, query or fragment is reported as-is, so
/// it never matches an allowed scheme. Returns `None` for relative references.
#[must_use]
pub fn url_scheme(value: &str) -> Option<String> {
    let numeric = decode_numeric_refs(value);
    let decoded = html_escape::decode_html_entities(&numeric);
    let normalized: String = decoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect();

    let colon = normalized.find(':')?;
    let candidate = &normalized[..colon];
    match candidate.find(['/', '?', '#', '&']) {
        _ if candidate.is_empty() => None,
        Some(at) if candidate.as_bytes()[at] != b'&' => None,
        _ => Some(candidate.to_ascii_lowercase()),
    }
}

fn decode_numeric_refs(value: &str) -> Cow<'_, str> {
    NUMERIC_REF.replace_all(value, |caps: &regex::Captures<'_>| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (None, Some(dec)) => dec.as_str().parse::<u32>().ok(),
            (None, None) => None,
        };
        code.and_then(char::from_u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER)
            .to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html(r#""quoted""#), "&quot;quoted&quot;");
        assert_eq!(escape_html("it's"), "it&#x27;s");
    }

    #[test]
    fn test_url_scheme_plain() {
        assert_eq!(url_scheme("https://example.com"), Some("https".to_owned()));
        assert_eq!(url_scheme("mailto:a@b.c"), Some("mailto".to_owned()));
    }

    #[test]
    fn test_url_scheme_relative() {
        assert_eq!(url_scheme("./page.md"), None);
        assert_eq!(url_scheme("#section"), None);
        assert_eq!(url_scheme("/path/with:colon"), None);
        assert_eq!(url_scheme("?q=a:b"), None);
    }

    #[test]
    fn test_url_scheme_obfuscated() {
        assert_eq!(url_scheme(" JavaScript:alert(1)"), Some("javascript".to_owned()));
        assert_eq!(url_scheme("jav&#x09;ascript:alert(1)"), Some("javascript".to_owned()));
        assert_eq!(url_scheme("java\nscript:x"), Some("javascript".to_owned()));
    }

    #[test]
    fn test_url_scheme_unterminated_references() {
        assert_eq!(url_scheme("&#106avascript:alert(1)"), Some("javascript".to_owned()));
        assert_eq!(url_scheme("&#0000106avascript:alert(1)"), Some("javascript".to_owned()));
        assert_eq!(url_scheme("&#x6A&#x61vascript:alert(1)"), Some("javascript".to_owned()));
        // Hex digits are consumed greedily, as browsers do.
        assert_eq!(url_scheme("&#x6Aavascript:x"), Some("\u{6aa}vascript".to_owned()));
        // Left undecoded: reported verbatim rather than treated as relative.
        assert_eq!(url_scheme("&zzz;avascript:x"), Some("&zzz;avascript".to_owned()));
        assert_eq!(url_scheme("#frag&#58;x"), None);
        assert_eq!(url_scheme("?a=1&b=2:3"), None);
    }
}
