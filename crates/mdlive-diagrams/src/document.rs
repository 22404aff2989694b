//! The diagram-bearing document and its slots.
//!
//! Loading HTML replaces each diagram block with a slot. Slots are addressed
//! through [`SlotHandle`]s taken from a single snapshot per pass; loading new
//! HTML bumps the generation, so handles from a superseded pass can no longer
//! write.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mdlive_renderer::escape_html;

use crate::extract::{DiagramBlock, Piece, split_diagrams};

/// Rendering state of one diagram slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    /// Not rendered yet.
    Placeholder,
    /// Sanitized SVG markup.
    Rendered { svg: String },
    /// Rendering failed; the source is shown with this message.
    Failed { message: String },
}

/// Stable reference to a slot within one document generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotHandle {
    generation: u64,
    position: usize,
    /// Index of the diagram among the blocks of its pass.
    pub index: usize,
}

#[derive(Debug)]
struct Slot {
    block: DiagramBlock,
    state: SlotState,
}

#[derive(Debug)]
enum Segment {
    Html(String),
    Slot(Slot),
}

/// Write rejected because the handle belongs to an older generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("slot handle from generation {handle} is stale (current {current})")]
pub struct StaleHandle {
    pub handle: u64,
    pub current: u64,
}

/// A rendered document whose diagram blocks are filled in asynchronously.
#[derive(Debug, Default)]
pub struct DiagramDocument {
    generation: u64,
    source: Option<String>,
    segments: Vec<Segment>,
}

impl DiagramDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the content with `html`, turning diagram blocks into
    /// placeholders. Returns the slot snapshot for the new generation.
    pub fn load(&mut self, html: &str) -> Vec<(SlotHandle, DiagramBlock)> {
        self.generation += 1;
        self.source = Some(html.to_owned());
        self.segments = split_diagrams(html)
            .into_iter()
            .map(|piece| match piece {
                Piece::Html(html) => Segment::Html(html),
                Piece::Diagram(block) => Segment::Slot(Slot {
                    block,
                    state: SlotState::Placeholder,
                }),
            })
            .collect();
        self.slots()
    }

    /// Snapshot of the current generation's slots, in document order.
    #[must_use]
    pub fn slots(&self) -> Vec<(SlotHandle, DiagramBlock)> {
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(position, segment)| match segment {
                Segment::Slot(slot) => Some((
                    SlotHandle {
                        generation: self.generation,
                        position,
                        index: slot.block.index,
                    },
                    slot.block.clone(),
                )),
                Segment::Html(_) => None,
            })
            .collect()
    }

    /// Set the state of the slot `handle` points to.
    pub fn replace(&mut self, handle: SlotHandle, state: SlotState) -> Result<(), StaleHandle> {
        let stale = StaleHandle {
            handle: handle.generation,
            current: self.generation,
        };
        if handle.generation != self.generation {
            return Err(stale);
        }
        match self.segments.get_mut(handle.position) {
            Some(Segment::Slot(slot)) if slot.block.index == handle.index => {
                slot.state = state;
                Ok(())
            }
            _ => Err(stale),
        }
    }

    /// HTML the document was last loaded from.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// States of all slots, in document order.
    #[must_use]
    pub fn states(&self) -> Vec<&SlotState> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Slot(slot) => Some(&slot.state),
                Segment::Html(_) => None,
            })
            .collect()
    }

    /// Whether any slot holds a rendered diagram.
    #[must_use]
    pub fn has_rendered(&self) -> bool {
        self.states()
            .iter()
            .any(|state| matches!(state, SlotState::Rendered { .. }))
    }

    /// Serialize the document with slots expanded.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Html(html) => out.push_str(html),
                Segment::Slot(slot) => out.push_str(&slot_html(slot)),
            }
        }
        out
    }
}

fn slot_html(slot: &Slot) -> String {
    let block = &slot.block;
    let lang = block.language.kroki_endpoint();
    let index = block.index;
    match &slot.state {
        SlotState::Placeholder => format!(
            r#"<figure class="diagram diagram-{lang} diagram-pending" data-diagram-index="{index}"><pre><code>{}</code></pre></figure>"#,
            escape_html(&block.code)
        ),
        SlotState::Rendered { svg } => format!(
            r#"<figure class="diagram diagram-{lang}" data-diagram-index="{index}">{svg}</figure>"#
        ),
        SlotState::Failed { message } => format!(
            r#"<figure class="diagram diagram-{lang} diagram-error" data-diagram-index="{index}"><pre><code>{}</code></pre><figcaption class="diagram-error-message">Diagram rendering failed: {}</figcaption></figure>"#,
            escape_html(&block.code),
            escape_html(message)
        ),
    }
}

/// A document shared between the renderer and its readers.
#[derive(Debug, Clone, Default)]
pub struct SharedDocument(Arc<Mutex<DiagramDocument>>);

impl SharedDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, DiagramDocument> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn to_html(&self) -> String {
        self.lock().to_html()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HTML: &str = concat!(
        "<p>before</p>",
        "<pre><code class=\"language-mermaid\">graph TD</code></pre>",
        "<p>middle</p>",
        "<pre><code class=\"language-dot\">digraph { a -&gt; b }</code></pre>",
    );

    #[test]
    fn test_load_creates_placeholders() {
        let mut doc = DiagramDocument::new();
        let slots = doc.load(HTML);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].1.index, 0);
        assert_eq!(slots[1].1.code, "digraph { a -> b }");
        assert_eq!(doc.states(), vec![&SlotState::Placeholder, &SlotState::Placeholder]);
        assert!(!doc.has_rendered());
        assert_eq!(doc.source(), Some(HTML));
    }

    #[test]
    fn test_replace_and_serialize() {
        let mut doc = DiagramDocument::new();
        let slots = doc.load(HTML);
        doc.replace(
            slots[0].0,
            SlotState::Rendered {
                svg: "<svg></svg>".to_owned(),
            },
        )
        .unwrap();
        doc.replace(
            slots[1].0,
            SlotState::Failed {
                message: "bad <input>".to_owned(),
            },
        )
        .unwrap();

        assert_eq!(
            doc.to_html(),
            concat!(
                "<p>before</p>",
                r#"<figure class="diagram diagram-mermaid" data-diagram-index="0"><svg></svg></figure>"#,
                "<p>middle</p>",
                r#"<figure class="diagram diagram-graphviz diagram-error" data-diagram-index="1"><pre><code>digraph { a -&gt; b }</code></pre><figcaption class="diagram-error-message">Diagram rendering failed: bad &lt;input&gt;</figcaption></figure>"#,
            )
        );
        assert!(doc.has_rendered());
    }

    #[test]
    fn test_stale_handle_rejected() {
        let mut doc = DiagramDocument::new();
        let old = doc.load(HTML);
        let new = doc.load(HTML);
        let err = doc
            .replace(old[0].0, SlotState::Placeholder)
            .unwrap_err();
        assert_eq!(err, StaleHandle { handle: 1, current: 2 });
        assert!(doc.replace(new[0].0, SlotState::Placeholder).is_ok());
    }

    #[test]
    fn test_placeholder_shows_escaped_source() {
        let mut doc = DiagramDocument::new();
        doc.load("<pre><code class=\"language-mermaid\">a --&gt; b</code></pre>");
        assert_eq!(
            doc.to_html(),
            r#"<figure class="diagram diagram-mermaid diagram-pending" data-diagram-index="0"><pre><code>a --&gt; b</code></pre></figure>"#
        );
    }

    #[test]
    fn test_shared_document() {
        let shared = SharedDocument::new();
        let slots = shared.lock().load(HTML);
        let reader = shared.clone();
        shared
            .lock()
            .replace(
                slots[0].0,
                SlotState::Rendered {
                    svg: "<svg/>".to_owned(),
                },
            )
            .unwrap();
        assert!(reader.to_html().contains("<svg/>"));
    }
}
