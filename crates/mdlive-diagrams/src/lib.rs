//! Diagram rendering for live Markdown documents.
//!
//! Diagram code blocks in rendered HTML (`language-mermaid`, `language-plantuml`,
//! ...) are replaced by slots and filled with inline SVG produced by a
//! [`DiagramEngine`]:
//! - [`DiagramEngineState`]: initializes the engine once per theme, never concurrently
//! - [`DiagramRenderer`]: full passes for new HTML, in-place re-skin for theme changes
//! - [`DiagramDocument`]: slot bookkeeping with stale-handle rejection
//! - [`KrokiEngine`]: the default engine, backed by a Kroki server
//!
//! Engine output is sanitized before it reaches the document, and a failing
//! block only affects its own slot.
//!
//! # Example
//!
//! ```ignore
//! use mdlive_diagrams::{DiagramRenderer, KrokiEngine, MountFlag, SharedDocument};
//! use mdlive_renderer::{render, theme};
//!
//! let page = render("```mermaid\ngraph TD\nA --> B\n```", &theme::DARK)?;
//! let renderer = DiagramRenderer::new(KrokiEngine::new("https://kroki.io"));
//! let doc = SharedDocument::new();
//! renderer.process(&doc, &page.body, &theme::DARK, &MountFlag::new()).await;
//! let html = theme::DARK.wrap(&doc.to_html());
//! ```

mod cache;
mod consts;
mod document;
mod engine;
mod extract;
mod kroki;
mod language;
mod renderer;
mod sanitize;
mod state;

pub use cache::{DiagramCache, DiagramKey};
pub use document::{DiagramDocument, SharedDocument, SlotHandle, SlotState, StaleHandle};
pub use engine::{DiagramEngine, DiagramError, DiagramRequest, EngineError};
pub use extract::{DiagramBlock, extract_diagrams};
pub use kroki::KrokiEngine;
pub use language::DiagramLanguage;
pub use renderer::{DiagramRenderer, MountFlag, PassKind, PassOutcome};
pub use sanitize::sanitize_svg;
pub use state::{DiagramEngineState, EngineSnapshot};
