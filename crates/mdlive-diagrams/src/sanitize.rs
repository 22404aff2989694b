//! Sanitization of engine-produced SVG.
//!
//! Runs independently of the document sanitizer, since SVG arrives after the
//! document has been cleaned.

use lol_html::{RewriteStrSettings, element, rewrite_str};
use mdlive_renderer::url_scheme;

/// Elements removed together with their content.
const DROP_WITH_CONTENT: &[&str] = &["script", "iframe", "object", "embed", "handler"];

/// Attributes holding URLs.
const URL_ATTRIBUTES: &[&str] = &["href", "xlink:href", "src", "action", "formaction"];

/// SMIL elements that can rewrite another element's attributes at runtime.
const ANIMATION_ELEMENTS: &[&str] = &["animate", "set", "animatemotion", "animatetransform"];

/// An animation targeting a URL or handler attribute can inject a script link
/// through `values`/`to`/`from`/`by`, so it is dropped outright.
fn rewrites_unsafe_attribute(attribute_name: Option<&str>) -> bool {
    attribute_name.is_some_and(|target| {
        let target = target.trim().to_ascii_lowercase();
        target.starts_with("on") || URL_ATTRIBUTES.contains(&target.as_str())
    })
}

fn dangerous_url(value: &str) -> bool {
    match url_scheme(value).as_deref() {
        None | Some("http" | "https" | "mailto") => false,
        Some("data") => !html_escape::decode_html_entities(value)
            .trim_start()
            .to_ascii_lowercase()
            .starts_with("data:image/"),
        Some(_) => true,
    }
}

/// Strip scripts, event handlers and script links from SVG markup.
pub fn sanitize_svg(svg: &str) -> Result<String, lol_html::errors::RewritingError> {
    let handlers = vec![element!("*", |el| {
        if el.removed() {
            return Ok(());
        }
        let tag = el.tag_name().to_ascii_lowercase();
        let attrs: Vec<(String, String)> = el
            .attributes()
            .iter()
            .map(|a| (a.name(), a.value()))
            .collect();

        let animated = attrs
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("attributename"))
            .map(|(_, value)| value.as_str());
        if DROP_WITH_CONTENT.contains(&tag.as_str())
            || (ANIMATION_ELEMENTS.contains(&tag.as_str()) && rewrites_unsafe_attribute(animated))
        {
            el.remove();
            return Ok(());
        }

        for (name, value) in attrs {
            let lc_name = name.to_ascii_lowercase();
            let drop = lc_name.starts_with("on")
                || (URL_ATTRIBUTES.contains(&lc_name.as_str()) && dangerous_url(&value));
            if drop {
                el.remove_attribute(&name);
            }
        }
        Ok(())
    })];

    rewrite_str(
        svg,
        RewriteStrSettings {
            element_content_handlers: handlers,
            ..RewriteStrSettings::new()
        },
    )
}
