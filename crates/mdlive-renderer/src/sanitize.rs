//! Allow-list HTML sanitization.
//!
//! [`AllowListSanitizer`] is the default [`Sanitizer`]: a streaming
//! `lol_html` rewrite that keeps only known-safe tags and attributes. Active
//! content elements are removed together with their content, every other
//! unknown element is unwrapped so its text survives.

use lol_html::{RewriteStrSettings, doc_comments, element, rewrite_str};
use regex::Regex;
use std::sync::LazyLock;

use crate::error::SanitizeError;
use crate::util::url_scheme;

/// Turns untrusted HTML into HTML that is safe to insert into a page.
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, html: &str) -> Result<String, SanitizeError>;
}

/// Elements dropped together with everything inside them.
const DROP_WITH_CONTENT: &[&str] = &[
    "script", "style", "iframe", "frame", "frameset", "object", "embed", "applet", "template",
    "noscript", "svg", "math", "form", "textarea", "select", "button", "link", "meta", "base",
    "title", "head",
];

/// Elements kept in the output.
const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "b", "blockquote", "br", "caption", "cite", "code", "col", "colgroup", "dd",
    "del", "details", "dfn", "div", "dl", "dt", "em", "figcaption", "figure", "h1", "h2", "h3",
    "h4", "h5", "h6", "hr", "i", "img", "input", "ins", "kbd", "li", "mark", "ol", "p", "pre",
    "q", "s", "samp", "section", "small", "span", "strong", "sub", "summary", "sup", "table",
    "tbody", "td", "tfoot", "th", "thead", "tr", "u", "ul", "var",
];

/// Attributes allowed on every kept element.
const GLOBAL_ATTRIBUTES: &[&str] = &["id", "class", "title", "lang", "dir"];

/// URL schemes allowed in `href`. Relative references are always allowed.
const LINK_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

/// URL schemes allowed in `img` `src`. `data:` is further limited to raster images.
const IMAGE_SCHEMES: &[&str] = &["http", "https", "data"];

const DATA_IMAGE_TYPES: &[&str] = &[
    "data:image/png",
    "data:image/gif",
    "data:image/jpeg",
    "data:image/jpg",
    "data:image/webp",
];

static TEXT_ALIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*text-align\s*:\s*(left|right|center)\s*;?\s*$")
        .expect("TEXT_ALIGN regex is valid")
});

fn tag_specific_attribute(tag: &str, attr: &str) -> bool {
    matches!(
        (tag, attr),
        ("a", "href" | "name")
            | ("img", "src" | "alt" | "width" | "height")
            | ("input", "type" | "checked" | "disabled")
            | ("td" | "th", "colspan" | "rowspan" | "align" | "style")
            | ("col" | "colgroup", "span")
            | ("ol", "start" | "type")
            | ("li", "value")
            | ("details", "open")
            | ("q" | "blockquote" | "del" | "ins", "cite")
    )
}

/// Check a URL-valued attribute against the allowed schemes.
fn url_allowed(tag: &str, attr: &str, value: &str) -> bool {
    match url_scheme(value) {
        None => true,
        Some(scheme) if tag == "img" && attr == "src" => {
            if scheme == "data" {
                let decoded = html_escape::decode_html_entities(value);
                let lower = decoded.trim_start().to_ascii_lowercase();
                DATA_IMAGE_TYPES.iter().any(|prefix| lower.starts_with(prefix))
            } else {
                IMAGE_SCHEMES.contains(&scheme.as_str())
            }
        }
        Some(scheme) => LINK_SCHEMES.contains(&scheme.as_str()),
    }
}

/// Default allow-list sanitizer.
#[derive(Clone, Debug, Default)]
pub struct AllowListSanitizer;

impl AllowListSanitizer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Sanitizer for AllowListSanitizer {
    fn sanitize(&self, html: &str) -> Result<String, SanitizeError> {
        if html.is_empty() {
            return Ok(String::new());
        }

        let element_handlers = vec![element!("*", |el| {
            if el.removed() {
                return Ok(());
            }
            let tag = el.tag_name().to_ascii_lowercase();

            if DROP_WITH_CONTENT.contains(&tag.as_str()) {
                el.remove();
                return Ok(());
            }
            if !ALLOWED_TAGS.contains(&tag.as_str()) {
                el.remove_and_keep_content();
                return Ok(());
            }
            if tag == "input"
                && !el
                    .get_attribute("type")
                    .is_some_and(|t| t.eq_ignore_ascii_case("checkbox"))
            {
                el.remove();
                return Ok(());
            }

            let attrs: Vec<(String, String)> = el
                .attributes()
                .iter()
                .map(|a| (a.name(), a.value()))
                .collect();

            for (name, value) in attrs {
                let lc_name = name.to_ascii_lowercase();
                let allowed = GLOBAL_ATTRIBUTES.contains(&lc_name.as_str())
                    || tag_specific_attribute(&tag, &lc_name);

                let keep = allowed
                    && match lc_name.as_str() {
                        "href" | "src" | "cite" => url_allowed(&tag, &lc_name, &value),
                        "style" => TEXT_ALIGN.is_match(&value),
                        _ => true,
                    };

                if !keep {
                    tracing::debug!(tag = %tag, attribute = %lc_name, "Dropped attribute");
                    el.remove_attribute(&name);
                }
            }

            Ok(())
        })];

        let document_handlers = vec![doc_comments!(|c| {
            c.remove();
            Ok(())
        })];

        let output = rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: element_handlers,
                document_content_handlers: document_handlers,
                ..RewriteStrSettings::new()
            },
        )?;
        Ok(output)
    }
}
