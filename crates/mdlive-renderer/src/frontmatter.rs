//! YAML frontmatter splitting.
//!
//! A document whose first line is `---` and which contains a later line that
//! is exactly `---` or `...` carries a YAML metadata block. Anything else is
//! treated as plain content.

use serde_json::{Map, Value};

/// Parsed frontmatter metadata.
///
/// Always a mapping; documents without usable metadata get an empty one.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Frontmatter(Map<String, Value>);

impl Frontmatter {
    /// Look up a top-level key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a top-level string value.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Result of splitting a document.
#[derive(Debug)]
pub struct Split<'a> {
    pub frontmatter: Frontmatter,
    pub content: &'a str,
    /// Set when a metadata block was present but could not be used.
    pub warning: Option<String>,
}

/// Split `markdown` into frontmatter and body content.
///
/// Never fails: unparseable or non-mapping metadata yields an empty
/// frontmatter and the unchanged input as content, with a warning.
pub fn split(markdown: &str) -> Split<'_> {
    let unchanged = |warning| Split {
        frontmatter: Frontmatter::default(),
        content: markdown,
        warning,
    };

    let Some((yaml, content)) = find_block(markdown) else {
        return unchanged(None);
    };

    if yaml.trim().is_empty() {
        return Split {
            frontmatter: Frontmatter::default(),
            content,
            warning: None,
        };
    }

    match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Object(map)) => Split {
            frontmatter: Frontmatter(map),
            content,
            warning: None,
        },
        Ok(Value::Null) => Split {
            frontmatter: Frontmatter::default(),
            content,
            warning: None,
        },
        Ok(_) => {
            tracing::warn!("Frontmatter is not a mapping, ignoring");
            unchanged(Some("Frontmatter is not a mapping".to_owned()))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse frontmatter");
            unchanged(Some(format!("Invalid frontmatter: {e}")))
        }
    }
}

/// Locate the metadata block, returning `(yaml, content_after_block)`.
fn find_block(markdown: &str) -> Option<(&str, &str)> {
    let input = markdown.strip_prefix('\u{feff}').unwrap_or(markdown);
    let (first, rest) = split_line(input)?;
    if first.trim_end() != "---" {
        return None;
    }

    let mut offset = 0;
    let mut remaining = rest;
    while let Some((line, after)) = split_line(remaining) {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            return Some((&rest[..offset], after));
        }
        offset += remaining.len() - after.len();
        remaining = after;
    }
    None
}

/// Split off the first line. The returned line excludes its terminator.
fn split_line(s: &str) -> Option<(&str, &str)> {
    if s.is_empty() {
        return None;
    }
    match s.find('\n') {
        Some(pos) => Some((&s[..pos], &s[pos + 1..])),
        None => Some((s, "")),
    }
}
