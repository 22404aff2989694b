//! Heading ID derivation and document-scoped disambiguation.

use std::collections::{HashMap, HashSet};

/// Derive an anchor ID from heading text.
///
/// Converts to lowercase, replaces runs of whitespace, dashes and underscores
/// with a single dash, and removes every other non-alphanumeric character.
/// Returns an empty string when the text has no ASCII alphanumerics.
///
/// # Examples
///
/// ```
/// use mdlive_renderer::heading_id;
///
/// assert_eq!(heading_id("Hello World!"), "hello-world");
/// assert_eq!(heading_id("  snake_case  "), "snake-case");
/// assert_eq!(heading_id("???"), "");
/// ```
#[must_use]
pub fn heading_id(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last_was_dash = true; // Prevents leading dash

    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Counter-based allocator producing unique IDs within one document.
///
/// The first occurrence of a base ID is returned as-is, later ones get a
/// numeric suffix (`base-1`, `base-2`, ...). IDs reserved up front (explicit
/// heading IDs) are never handed out.
#[derive(Debug, Default)]
pub struct IdAllocator {
    counts: HashMap<String, usize>,
    used: HashSet<String>,
}

impl IdAllocator {
    /// Create an empty allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an ID as taken without allocating it.
    pub fn reserve(&mut self, id: &str) {
        self.used.insert(id.to_owned());
    }

    /// Allocate a unique ID for `base`.
    pub fn allocate(&mut self, base: &str) -> String {
        let count = self.counts.entry(base.to_owned()).or_default();
        let mut candidate = match *count {
            0 => base.to_owned(),
            n => format!("{base}-{n}"),
        };
        while self.used.contains(&candidate) {
            *count += 1;
            candidate = format!("{base}-{count}");
        }
        *count += 1;
        self.used.insert(candidate.clone());
        candidate
    }
}
