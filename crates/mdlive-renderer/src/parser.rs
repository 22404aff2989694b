//! Markdown grammar seam.
//!
//! The pipeline only needs `markdown -> html`. [`CommonMarkParser`] is the
//! default implementation on top of `pulldown-cmark`.

use pulldown_cmark::{Options, Parser, html};

use crate::error::ParseError;

/// Converts Markdown text to (unsanitized) HTML.
pub trait MarkdownParser: Send + Sync {
    fn parse(&self, markdown: &str) -> Result<String, ParseError>;
}

/// Build `pulldown-cmark` options.
///
/// Heading attributes and footnotes are always on so that `{#id}` anchors and
/// footnote references behave the same regardless of GFM.
#[must_use]
pub fn parser_options(gfm: bool) -> Options {
    let base = Options::ENABLE_HEADING_ATTRIBUTES | Options::ENABLE_FOOTNOTES;
    if gfm {
        base | Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_GFM
    } else {
        base
    }
}

/// CommonMark parser with optional GitHub Flavored Markdown extensions.
#[derive(Clone, Debug)]
pub struct CommonMarkParser {
    gfm: bool,
    max_input_bytes: Option<usize>,
}

impl CommonMarkParser {
    /// Create a parser with GFM enabled and no input limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            gfm: true,
            max_input_bytes: None,
        }
    }

    /// Enable or disable GitHub Flavored Markdown features.
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Reject documents larger than `limit` bytes.
    #[must_use]
    pub fn with_max_input_bytes(mut self, limit: usize) -> Self {
        self.max_input_bytes = Some(limit);
        self
    }

    #[must_use]
    pub fn gfm(&self) -> bool {
        self.gfm
    }
}

impl Default for CommonMarkParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownParser for CommonMarkParser {
    fn parse(&self, markdown: &str) -> Result<String, ParseError> {
        if let Some(limit) = self.max_input_bytes
            && markdown.len() > limit
        {
            return Err(ParseError::TooLarge {
                size: markdown.len(),
                limit,
            });
        }

        let parser = Parser::new_ext(markdown, parser_options(self.gfm));
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        Ok(out)
    }
}
