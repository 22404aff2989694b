//! Standalone HTML page around a rendered document.

use std::fmt::Write;

use mdlive_renderer::{RenderResult, TocNode, escape_html};
use mdlive_tracker::ObservationZone;

/// Settings the page exposes to the view's heading tracker.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TrackerSettings {
    pub zone: ObservationZone,
    pub discovery_timeout_ms: u64,
}

/// Document title: frontmatter `title`, then the first heading, then `fallback`.
pub(crate) fn document_title<'a>(result: &'a RenderResult, fallback: &'a str) -> &'a str {
    result
        .frontmatter
        .get_str("title")
        .or_else(|| result.toc_items.first().map(|node| node.heading.text.as_str()))
        .unwrap_or(fallback)
}

/// Build a complete page with outline navigation.
pub(crate) fn render_page(
    title: &str,
    body: &str,
    toc: &[TocNode],
    tracker: TrackerSettings,
) -> String {
    let mut page = String::with_capacity(body.len() + 1024);
    page.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(page, "<title>{}</title>", escape_html(title));
    page.push_str("</head>\n<body>\n");
    let _ = writeln!(
        page,
        "<nav class=\"mdlive-toc\" data-root-margin=\"{}\" data-discovery-timeout-ms=\"{}\">",
        tracker.zone.root_margin(),
        tracker.discovery_timeout_ms
    );
    write_toc(&mut page, toc);
    page.push_str("</nav>\n<main>\n");
    page.push_str(body);
    page.push_str("\n</main>\n</body>\n</html>\n");
    page
}

fn write_toc(out: &mut String, nodes: &[TocNode]) {
    if nodes.is_empty() {
        return;
    }
    out.push_str("<ul>");
    for node in nodes {
        let _ = write!(
            out,
            "<li><a href=\"#{}\">{}</a>",
            escape_html(&node.heading.id),
            escape_html(&node.heading.text)
        );
        write_toc(out, &node.children);
        out.push_str("</li>");
    }
    out.push_str("</ul>");
}

/// Plain-text outline, one heading per line, indented by depth.
pub(crate) fn toc_text(nodes: &[TocNode]) -> String {
    fn walk(out: &mut String, nodes: &[TocNode], depth: usize) {
        for node in nodes {
            let _ = writeln!(
                out,
                "{}- {} (#{})",
                "  ".repeat(depth),
                node.heading.text,
                node.heading.id
            );
            walk(out, &node.children, depth + 1);
        }
    }

    let mut out = String::new();
    walk(&mut out, nodes, 0);
    out
}
