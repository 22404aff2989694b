//! The Markdown to themed HTML pipeline.
//!
//! Stages run in a fixed order: frontmatter split, parse, sanitize, heading
//! anchor injection, theme wrap. Sanitization always runs, including on the
//! fallback output produced when parsing fails.

use crate::anchors::inject_heading_ids;
use crate::error::RenderError;
use crate::frontmatter::{self, Frontmatter};
use crate::parser::{CommonMarkParser, MarkdownParser};
use crate::sanitize::{AllowListSanitizer, Sanitizer};
use crate::theme::ThemeData;
use crate::toc::{TocNode, outline};
use crate::util::escape_html;

/// Result of rendering one document.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RenderResult {
    /// Sanitized, anchored and theme-wrapped HTML.
    pub html: String,
    /// Sanitized and anchored HTML before the theme wrap.
    pub body: String,
    /// The input, byte for byte.
    pub raw_markdown: String,
    /// Markdown body with frontmatter removed.
    pub content: String,
    pub frontmatter: Frontmatter,
    /// Document outline, read from the anchored headings of `body`.
    pub toc_items: Vec<TocNode>,
    /// Theme the HTML was wrapped in.
    pub theme: &'static str,
    /// Non-fatal problems encountered while rendering.
    pub warnings: Vec<String>,
}

/// Render pipeline over a pluggable parser and sanitizer.
pub struct Pipeline<P = CommonMarkParser, S = AllowListSanitizer> {
    parser: P,
    sanitizer: S,
}

impl Pipeline {
    /// Pipeline with the default CommonMark parser and allow-list sanitizer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(CommonMarkParser::new(), AllowListSanitizer::new())
    }

    /// Enable or disable GitHub Flavored Markdown features.
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.parser = self.parser.with_gfm(enabled);
        self
    }

    /// Render documents larger than `limit` bytes as escaped text.
    #[must_use]
    pub fn with_max_input_bytes(mut self, limit: usize) -> Self {
        self.parser = self.parser.with_max_input_bytes(limit);
        self
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: MarkdownParser, S: Sanitizer> Pipeline<P, S> {
    /// Pipeline with custom parser and sanitizer implementations.
    pub fn with_parts(parser: P, sanitizer: S) -> Self {
        Self { parser, sanitizer }
    }

    /// Render `markdown` in the given theme.
    ///
    /// Frontmatter and parse failures degrade gracefully and are reported in
    /// [`RenderResult::warnings`]. Sanitizer failures are returned as errors.
    pub fn render(
        &self,
        markdown: &str,
        theme: &'static ThemeData,
    ) -> Result<RenderResult, RenderError> {
        let split = frontmatter::split(markdown);
        let mut warnings: Vec<String> = split.warning.into_iter().collect();
        let content = split.content;

        let body = self.anchored_body(content, &mut warnings)?;
        let html = theme.wrap(&body);

        tracing::debug!(
            theme = theme.id,
            bytes = html.len(),
            warnings = warnings.len(),
            "Rendered document"
        );

        Ok(RenderResult {
            html,
            toc_items: outline(&body),
            body,
            raw_markdown: markdown.to_owned(),
            content: content.to_owned(),
            frontmatter: split.frontmatter,
            theme: theme.id,
            warnings,
        })
    }

    /// Outline of `markdown` as [`render`](Self::render) would report it.
    pub fn outline(&self, markdown: &str) -> Result<Vec<TocNode>, RenderError> {
        let content = frontmatter::split(markdown).content;
        let body = self.anchored_body(content, &mut Vec::new())?;
        Ok(outline(&body))
    }

    /// Parse, sanitize and anchor a frontmatter-free document.
    fn anchored_body(
        &self,
        content: &str,
        warnings: &mut Vec<String>,
    ) -> Result<String, RenderError> {
        let parsed = match self.parser.parse(content) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(error = %e, "Markdown parsing failed, rendering source as text");
                warnings.push(format!("Markdown parsing failed: {e}"));
                parse_failure_html(content, &e.to_string())
            }
        };

        let safe = self.sanitizer.sanitize(&parsed)?;
        Ok(inject_heading_ids(&safe))
    }
}

fn parse_failure_html(content: &str, message: &str) -> String {
    format!(
        "<div class=\"mdlive-error\"><strong>Failed to render Markdown:</strong> {}</div>\n<pre>{}</pre>\n",
        escape_html(message),
        escape_html(content)
    )
}

/// Render `markdown` with the default pipeline.
pub fn render(markdown: &str, theme: &'static ThemeData) -> Result<RenderResult, RenderError> {
    Pipeline::new().render(markdown, theme)
}
