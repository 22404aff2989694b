//! Markdown to safe, themed HTML.
//!
//! This crate turns a Markdown document into HTML that can be inserted into a
//! live view, together with its metadata and outline.
//!
//! # Pipeline
//!
//! [`render`] runs these stages in order:
//! 1. Split YAML frontmatter from the body ([`frontmatter`])
//! 2. Parse Markdown to HTML ([`MarkdownParser`], default [`CommonMarkParser`])
//! 3. Sanitize against an allow-list ([`Sanitizer`], default [`AllowListSanitizer`])
//! 4. Add anchor IDs to `h1`-`h3` headings
//! 5. Wrap in a theme container ([`ThemeData`])
//!
//! The outline ([`RenderResult::toc_items`], or [`generate_toc`] on its own)
//! is read from the headings anchored in stage 4, so every outline link
//! resolves in the rendered HTML.
//!
//! # Example
//!
//! ```
//! use mdlive_renderer::{render, theme};
//!
//! let result = render("# Hello\n\n**Bold** text", &theme::LIGHT).unwrap();
//! assert!(result.html.contains(r#"<h1 id="hello">Hello</h1>"#));
//! assert_eq!(result.toc_items[0].heading.id, "hello");
//! ```

mod anchors;
mod error;
pub mod frontmatter;
mod parser;
mod pipeline;
mod sanitize;
mod slug;
pub mod theme;
mod toc;
mod util;

pub use anchors::inject_heading_ids;
pub use error::{ParseError, RenderError, SanitizeError};
pub use frontmatter::Frontmatter;
pub use parser::{CommonMarkParser, MarkdownParser, parser_options};
pub use pipeline::{Pipeline, RenderResult, render};
pub use sanitize::{AllowListSanitizer, Sanitizer};
pub use slug::{IdAllocator, heading_id};
pub use theme::{Appearance, BUILTIN_THEMES, ThemeData};
pub use toc::{
    HeadingRecord, TocNode, build, extract, flatten, generate_toc, normalize, outline,
};
pub use util::{escape_html, url_scheme};
