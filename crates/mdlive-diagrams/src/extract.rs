//! Locating diagram blocks in rendered HTML.

use std::sync::LazyLock;

use regex::Regex;

use crate::language::DiagramLanguage;

static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<pre><code class="language-([A-Za-z0-9_+-]+)">(.*?)</code></pre>"#)
        .expect("CODE_BLOCK regex is valid")
});

/// A diagram found in rendered HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramBlock {
    /// Diagram source with HTML entities decoded.
    pub code: String,
    /// Zero-based position among the diagram blocks of one pass.
    pub index: usize,
    pub language: DiagramLanguage,
}

/// HTML split around diagram blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    Html(String),
    Diagram(DiagramBlock),
}

/// Split `html` into plain HTML runs and diagram blocks, in document order.
///
/// Code blocks in non-diagram languages stay part of the surrounding HTML.
#[must_use]
pub fn split_diagrams(html: &str) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut last = 0;
    let mut index = 0;

    for caps in CODE_BLOCK.captures_iter(html) {
        let Some(language) = DiagramLanguage::parse(&caps[1]) else {
            continue;
        };
        let Some(whole) = caps.get(0) else {
            continue;
        };

        if whole.start() > last {
            pieces.push(Piece::Html(html[last..whole.start()].to_owned()));
        }
        pieces.push(Piece::Diagram(DiagramBlock {
            code: html_escape::decode_html_entities(&caps[2]).into_owned(),
            index,
            language,
        }));
        index += 1;
        last = whole.end();
    }

    if last < html.len() {
        pieces.push(Piece::Html(html[last..].to_owned()));
    }
    pieces
}

/// Diagram blocks in `html`, in document order.
#[must_use]
pub fn extract_diagrams(html: &str) -> Vec<DiagramBlock> {
    split_diagrams(html)
        .into_iter()
        .filter_map(|piece| match piece {
            Piece::Diagram(block) => Some(block),
            Piece::Html(_) => None,
        })
        .collect()
}
