//! Heading extraction, hierarchy repair and outline construction.
//!
//! The outline is built in three independent steps:
//!
//! 1. [`extract`] scans Markdown for `h1`-`h3` headings.
//! 2. [`normalize`] repairs levels that skip their parent.
//! 3. [`build`] folds the flat list into a tree.
//!
//! [`outline`] runs steps 2 and 3 over the headings of anchored HTML, so
//! every outline ID is one the rendered document carries. [`generate_toc`]
//! does the same for a Markdown document via the default pipeline.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};

use crate::anchors::{MAX_ANCHOR_LEVEL, anchored_headings};
use crate::parser::parser_options;
use crate::pipeline::Pipeline;
use crate::slug::heading_id;
use crate::util::heading_level_to_num;

/// A heading found in a document.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HeadingRecord {
    /// Heading level (1-3).
    pub level: u8,
    /// Plain text content.
    pub text: String,
    /// Anchor ID, empty when the text has no ASCII alphanumerics.
    pub id: String,
}

/// A node of the document outline.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TocNode {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub heading: HeadingRecord,
    pub children: Vec<TocNode>,
}

impl TocNode {
    fn new(heading: HeadingRecord) -> Self {
        Self {
            heading,
            children: Vec::new(),
        }
    }

    /// Visit this node and its descendants in document order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a TocNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// Flatten an outline back into document order.
#[must_use]
pub fn flatten(nodes: &[TocNode]) -> Vec<&HeadingRecord> {
    let mut out = Vec::new();
    for node in nodes {
        node.walk(&mut |n| out.push(&n.heading));
    }
    out
}

/// Extract `h1`-`h3` headings from Markdown in document order.
///
/// IDs are base IDs: repeated titles share the same ID here. Explicit
/// `{#id}` attributes are used verbatim.
#[must_use]
pub fn extract(markdown: &str) -> Vec<HeadingRecord> {
    let mut headings = Vec::new();
    let mut current: Option<(u8, Option<String>, String)> = None;
    let mut image_depth = 0usize;

    for event in Parser::new_ext(markdown, parser_options(true)) {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                let id = id.map(|id| id.to_string());
                current = Some((heading_level_to_num(level), id, String::new()));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, id, text)) = current.take()
                    && level <= MAX_ANCHOR_LEVEL
                {
                    let text = text.trim().to_owned();
                    let id = id.unwrap_or_else(|| heading_id(&text));
                    headings.push(HeadingRecord { level, text, id });
                }
            }
            Event::Start(Tag::Image { .. }) => image_depth += 1,
            Event::End(TagEnd::Image) => image_depth = image_depth.saturating_sub(1),
            Event::Text(text) | Event::Code(text) if image_depth == 0 => {
                if let Some((_, _, buf)) = current.as_mut() {
                    buf.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some((_, _, buf)) = current.as_mut() {
                    buf.push(' ');
                }
            }
            _ => {}
        }
    }

    headings
}

/// Repair heading levels that skip their parent level.
///
/// A heading is kept as-is when it is level 1 or when an earlier heading in
/// the input had exactly the level above it. Any other heading becomes level
/// 2. Validity is judged against the input levels, not the repaired ones.
///
/// ```
/// use mdlive_renderer::{HeadingRecord, normalize};
///
/// let levels = |h: &[HeadingRecord]| h.iter().map(|h| h.level).collect::<Vec<_>>();
/// let heading = |level| HeadingRecord { level, text: String::new(), id: String::new() };
///
/// let input = vec![heading(3), heading(3), heading(2)];
/// assert_eq!(levels(&normalize(&input)), [2, 2, 2]);
/// ```
#[must_use]
pub fn normalize(headings: &[HeadingRecord]) -> Vec<HeadingRecord> {
    let mut seen = [false; 7];
    headings
        .iter()
        .map(|heading| {
            let level = usize::from(heading.level.min(6));
            let valid = level == 1 || (level > 1 && seen[level - 1]);
            seen[level] = true;
            HeadingRecord {
                level: if valid { heading.level } else { 2 },
                ..heading.clone()
            }
        })
        .collect()
}

/// Fold a flat heading list into an outline tree.
///
/// Headings become children of the nearest preceding heading with a lower
/// level. Pre-order traversal of the result equals the input order.
#[must_use]
pub fn build(headings: Vec<HeadingRecord>) -> Vec<TocNode> {
    fn attach(node: TocNode, stack: &mut [TocNode], roots: &mut Vec<TocNode>) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }

    let mut roots = Vec::new();
    let mut stack: Vec<TocNode> = Vec::new();

    for heading in headings {
        while stack
            .last()
            .is_some_and(|top| top.heading.level >= heading.level)
        {
            if let Some(node) = stack.pop() {
                attach(node, &mut stack, &mut roots);
            }
        }
        stack.push(TocNode::new(heading));
    }

    while let Some(node) = stack.pop() {
        attach(node, &mut stack, &mut roots);
    }

    roots
}

/// Build the outline of HTML produced by
/// [`inject_heading_ids`](crate::inject_heading_ids).
///
/// Only headings that received an anchor are listed, with the ID and text
/// they carry in the markup.
#[must_use]
pub fn outline(anchored_html: &str) -> Vec<TocNode> {
    build(normalize(&anchored_headings(anchored_html)))
}

/// Build the outline for a Markdown document.
///
/// Frontmatter is skipped, headings without an ID are dropped, and IDs are
/// the ones the default [`Pipeline`] puts into the rendered HTML.
#[must_use]
pub fn generate_toc(markdown: &str) -> Vec<TocNode> {
    Pipeline::new().outline(markdown).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Outline generation failed");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn heading(level: u8, text: &str) -> HeadingRecord {
        HeadingRecord {
            level,
            text: text.to_owned(),
            id: heading_id(text),
        }
    }

    fn levels(headings: &[HeadingRecord]) -> Vec<u8> {
        headings.iter().map(|h| h.level).collect()
    }

    fn with_levels(levels: &[u8]) -> Vec<HeadingRecord> {
        levels
            .iter()
            .enumerate()
            .map(|(i, &level)| heading(level, &format!("H{i}")))
            .collect()
    }

    #[test]
    fn test_extract_levels_and_order() {
        let headings = extract("# One\n\n## Two\n\n#### Four\n\n### Three\n");
        assert_eq!(
            headings,
            vec![heading(1, "One"), heading(2, "Two"), heading(3, "Three")]
        );
    }

    #[test]
    fn test_extract_inline_markup() {
        let headings = extract("## Use `foo` **now**");
        assert_eq!(headings[0].text, "Use foo now");
        assert_eq!(headings[0].id, "use-foo-now");
    }

    #[test]
    fn test_extract_ignores_code_fences() {
        let headings = extract("```\n# not a heading\n```\n\n# Real");
        assert_eq!(headings, vec![heading(1, "Real")]);
    }

    #[test]
    fn test_extract_setext() {
        let headings = extract("Title\n=====\n\nSection\n-------\n");
        assert_eq!(levels(&headings), vec![1, 2]);
    }

    #[test]
    fn test_extract_explicit_id() {
        let headings = extract("## Setup {#install}");
        assert_eq!(headings[0].text, "Setup");
        assert_eq!(headings[0].id, "install");
    }

    #[test]
    fn test_extract_skips_image_alt() {
        let headings = extract("# ![logo](logo.png) Project");
        assert_eq!(headings[0].text, "Project");
    }

    #[test]
    fn test_extract_keeps_base_ids() {
        let headings = extract("## Status\n\n## Status");
        assert_eq!(headings[0].id, "status");
        assert_eq!(headings[1].id, "status");
    }

    #[test]
    fn test_normalize_examples() {
        assert_eq!(levels(&normalize(&with_levels(&[3, 3, 2]))), vec![2, 2, 2]);
        assert_eq!(levels(&normalize(&with_levels(&[1, 3, 3]))), vec![1, 2, 2]);
        assert_eq!(levels(&normalize(&with_levels(&[2, 3, 2]))), vec![2, 3, 2]);
        assert_eq!(levels(&normalize(&with_levels(&[1, 3]))), vec![1, 2]);
    }

    #[test]
    fn test_normalize_uses_original_levels() {
        // The h3 at index 2 is valid because an original h2 precedes it,
        // even though that h2 came after an invalid h3.
        assert_eq!(
            levels(&normalize(&with_levels(&[1, 3, 2, 3]))),
            vec![1, 2, 2, 3]
        );
    }

    #[test]
    fn test_normalize_keeps_text_and_ids() {
        let input = vec![heading(3, "Deep")];
        let output = normalize(&input);
        assert_eq!(output[0].text, "Deep");
        assert_eq!(output[0].id, "deep");
    }

    #[test]
    fn test_normalize_empty() {
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn test_build_nested() {
        let tree = build(with_levels(&[1, 2, 3, 2, 1]));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[0].children[0].children.len(), 1);
        assert!(tree[1].children.is_empty());
    }

    #[test]
    fn test_build_siblings_at_root() {
        let tree = build(with_levels(&[2, 2, 2]));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_build_children_have_greater_level() {
        let tree = build(normalize(&with_levels(&[1, 3, 2, 3, 1, 2])));
        fn check(nodes: &[TocNode]) {
            for node in nodes {
                for child in &node.children {
                    assert!(child.heading.level > node.heading.level);
                }
                check(&node.children);
            }
        }
        check(&tree);
    }

    /// Every level sequence of length up to five over h1-h3.
    fn all_sequences() -> Vec<Vec<u8>> {
        let mut all = vec![vec![]];
        let mut frontier = vec![vec![]];
        for _ in 0..5 {
            let mut next = Vec::new();
            for seq in &frontier {
                for level in 1..=3 {
                    let mut s: Vec<u8> = seq.clone();
                    s.push(level);
                    next.push(s);
                }
            }
            all.extend(next.iter().cloned());
            frontier = next;
        }
        all
    }

    #[test]
    fn test_normalize_idempotent() {
        for seq in all_sequences() {
            let once = normalize(&with_levels(&seq));
            let twice = normalize(&once);
            assert_eq!(once, twice, "levels {seq:?}");
        }
    }

    #[test]
    fn test_build_preorder_matches_input() {
        for seq in all_sequences() {
            let normalized = normalize(&with_levels(&seq));
            let tree = build(normalized.clone());
            let flat: Vec<HeadingRecord> = flatten(&tree).into_iter().cloned().collect();
            assert_eq!(flat, normalized, "levels {seq:?}");
        }
    }

    #[test]
    fn test_generate_toc_disambiguates() {
        let toc = generate_toc("## Status\n\n## Status\n");
        let ids: Vec<_> = flatten(&toc).iter().map(|h| h.id.clone()).collect();
        assert_eq!(ids, vec!["status", "status-1"]);
    }

    #[test]
    fn test_generate_toc_drops_empty_ids() {
        let toc = generate_toc("# Title\n\n## ???\n\n## Next\n");
        let texts: Vec<_> = flatten(&toc).iter().map(|h| h.text.clone()).collect();
        assert_eq!(texts, vec!["Title", "Next"]);
    }

    #[test]
    fn test_generate_toc_skips_frontmatter() {
        let toc = generate_toc("---\ntitle: Doc\n---\n# Real\n");
        assert_eq!(toc.len(), 1);
        assert_eq!(toc[0].heading.text, "Real");
    }

    #[test]
    fn test_generate_toc_reserves_explicit_ids() {
        let toc = generate_toc("## Intro\n\n## Other {#intro}\n");
        let ids: Vec<_> = flatten(&toc).iter().map(|h| h.id.clone()).collect();
        assert_eq!(ids, vec!["intro-1", "intro"]);
    }

    #[test]
    fn test_generate_toc_counts_footnote_labels() {
        let toc = generate_toc("## Title[^1]\n\n[^1]: Note.\n");
        assert_eq!(toc[0].heading.id, "title1");
    }

    #[test]
    fn test_generate_toc_ignores_removed_markup() {
        let toc = generate_toc("## A <script>x</script> B\n");
        assert_eq!(toc[0].heading.text, "A B");
        assert_eq!(toc[0].heading.id, "a-b");
    }

    #[test]
    fn test_generate_toc_includes_html_headings() {
        let toc = generate_toc("<h2>Setup</h2>\n\n## Setup\n");
        let ids: Vec<_> = flatten(&toc).iter().map(|h| h.id.clone()).collect();
        assert_eq!(ids, vec!["setup", "setup-1"]);
    }

    #[test]
    fn test_outline_of_anchored_html() {
        let toc = outline(r#"<h1 id="a">A</h1><h3 id="b">B</h3><h2>Plain</h2>"#);
        assert_eq!(toc.len(), 1);
        assert_eq!(toc[0].children[0].heading.id, "b");
        assert_eq!(toc[0].children[0].heading.level, 2);
    }

    #[test]
    fn test_generate_toc_empty_document() {
        assert!(generate_toc("").is_empty());
        assert!(generate_toc("Just text.").is_empty());
    }
}
