//! Heading anchor injection for rendered HTML.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::slug::{IdAllocator, heading_id};
use crate::toc::HeadingRecord;

static HEADING_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<h([1-6])(\s[^>]*)?>").expect("HEADING_OPEN regex is valid"));

static ID_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)id\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("ID_ATTR regex is valid")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("TAG regex is valid"));

/// Deepest heading level that receives a derived anchor.
pub(crate) const MAX_ANCHOR_LEVEL: u8 = 3;

fn explicit_id(attrs: &str) -> Option<&str> {
    let caps = ID_ATTR.captures(attrs)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str())
}

/// Plain text of an HTML fragment: tags stripped, entities decoded.
fn text_content(fragment: &str) -> String {
    let stripped = TAG.replace_all(fragment, "");
    html_escape::decode_html_entities(&stripped).into_owned()
}

/// Add `id` attributes to `h1`-`h3` elements that lack one.
///
/// IDs already present on any heading are reserved first, then derived IDs
/// are allocated in document order so repeated titles get `-1`, `-2`, ...
/// suffixes. Headings whose text yields an empty ID are left untouched.
#[must_use]
pub fn inject_heading_ids(html: &str) -> String {
    let mut ids = IdAllocator::new();
    for caps in HEADING_OPEN.captures_iter(html) {
        if let Some(id) = caps.get(2).and_then(|m| explicit_id(m.as_str())) {
            ids.reserve(id);
        }
    }

    let mut out = String::with_capacity(html.len() + 64);
    let mut last = 0;

    for caps in HEADING_OPEN.captures_iter(html) {
        let Some(id) = derived_id(html, &caps, &mut ids) else {
            continue;
        };
        let open = caps.get(0).map_or(0..0, |m| m.range());
        let level = &caps[1];
        let attrs = caps.get(2).map_or("", |m| m.as_str());

        out.push_str(&html[last..open.start]);
        out.push_str(&format!(r#"<h{level} id="{id}"{attrs}>"#));
        last = open.end;
    }

    out.push_str(&html[last..]);
    out
}

fn derived_id(html: &str, caps: &Captures<'_>, ids: &mut IdAllocator) -> Option<String> {
    let level: u8 = caps[1].parse().ok()?;
    if level > MAX_ANCHOR_LEVEL {
        return None;
    }
    if caps.get(2).is_some_and(|m| explicit_id(m.as_str()).is_some()) {
        return None;
    }

    let start = caps.get(0)?.end();
    let close = format!("</h{level}>");
    let end = start + html[start..].find(&close)?;

    let base = heading_id(&text_content(&html[start..end]));
    if base.is_empty() {
        return None;
    }
    Some(ids.allocate(&base))
}

/// Anchored `h1`-`h3` headings of `html` in document order.
///
/// Expects the output of [`inject_heading_ids`]: headings without an `id`
/// are skipped, everything else is reported with the id and text it has in
/// the markup.
pub(crate) fn anchored_headings(html: &str) -> Vec<HeadingRecord> {
    HEADING_OPEN
        .captures_iter(html)
        .filter_map(|caps| {
            let level: u8 = caps[1].parse().ok()?;
            if level > MAX_ANCHOR_LEVEL {
                return None;
            }
            let id = explicit_id(caps.get(2)?.as_str())?.to_owned();
            let start = caps.get(0)?.end();
            let end = start + html[start..].find(&format!("</h{level}>"))?;
            let text = text_content(&html[start..end])
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            Some(HeadingRecord { level, text, id })
        })
        .collect()
}
