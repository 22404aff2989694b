//! Batch diagram rendering into a [`SharedDocument`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::join_all;
use mdlive_renderer::ThemeData;

use crate::cache::{DiagramCache, DiagramKey};
use crate::document::{SharedDocument, SlotHandle, SlotState};
use crate::engine::{DiagramEngine, DiagramError, DiagramRequest};
use crate::extract::DiagramBlock;
use crate::language::DiagramLanguage;
use crate::sanitize::sanitize_svg;
use crate::state::DiagramEngineState;

/// Whether the view owning a document is still alive.
///
/// Once cleared, renderers stop writing to the document.
#[derive(Debug, Clone)]
pub struct MountFlag(Arc<AtomicBool>);

impl MountFlag {
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn unmount(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for MountFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// How a pass treated the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// New HTML: blocks rendered fresh into placeholders.
    Full,
    /// Same HTML: existing diagrams re-rendered from their preserved source.
    InPlace,
}

/// Summary of one render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassOutcome {
    pub kind: PassKind,
    /// Slots written with rendered SVG.
    pub rendered: usize,
    /// Slots written with an error note.
    pub failed: usize,
    /// Results dropped because the view unmounted or the pass was superseded.
    pub discarded: usize,
}

impl PassOutcome {
    fn new(kind: PassKind) -> Self {
        Self {
            kind,
            rendered: 0,
            failed: 0,
            discarded: 0,
        }
    }
}

enum WriteResult {
    Rendered,
    Failed,
    Discarded,
}

/// Renders diagrams through an engine and writes them into documents.
pub struct DiagramRenderer<E> {
    state: DiagramEngineState<E>,
    cache: DiagramCache,
}

impl<E: DiagramEngine> DiagramRenderer<E> {
    pub fn new(engine: E) -> Self {
        Self::with_state(DiagramEngineState::new(engine))
    }

    /// Renderer over an existing, possibly shared, engine state.
    pub fn with_state(state: DiagramEngineState<E>) -> Self {
        Self {
            state,
            cache: DiagramCache::default(),
        }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: DiagramCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn state(&self) -> &DiagramEngineState<E> {
        &self.state
    }

    /// Render one diagram to sanitized SVG in `theme`.
    pub async fn render_diagram(
        &self,
        code: &str,
        language: DiagramLanguage,
        theme: &'static ThemeData,
    ) -> Result<String, DiagramError> {
        let key = DiagramKey {
            source: code,
            endpoint: language.kroki_endpoint(),
            theme: if language.is_themed() {
                theme.diagram_theme
            } else {
                ""
            },
        };
        if let Some(svg) = self.cache.get(&key) {
            tracing::debug!(language = key.endpoint, "Diagram cache hit");
            return Ok(svg);
        }

        self.state
            .ensure_initialized(theme)
            .await
            .map_err(DiagramError::Init)?;

        let request = DiagramRequest {
            source: code.to_owned(),
            language,
            theme,
        };
        let svg = self
            .state
            .engine()
            .render(&request)
            .await
            .map_err(DiagramError::Render)?;
        let svg = sanitize_svg(&svg).map_err(|e| DiagramError::Sanitize(e.to_string()))?;

        self.cache.insert(&key, &svg);
        Ok(svg)
    }

    /// Render `html` into `doc`, choosing between an in-place re-skin and a
    /// full pass.
    ///
    /// `html` is the document before any theme container is applied
    /// ([`RenderResult::body`](mdlive_renderer::RenderResult::body)), so a
    /// theme switch alone leaves it unchanged. When it equals what `doc` was
    /// last loaded from and diagrams are already rendered, every diagram is
    /// re-rendered from its preserved source. Otherwise the document is
    /// reloaded and all blocks are rendered fresh.
    pub async fn process(
        &self,
        doc: &SharedDocument,
        html: &str,
        theme: &'static ThemeData,
        mount: &MountFlag,
    ) -> PassOutcome {
        let unchanged = {
            let doc = doc.lock();
            doc.source() == Some(html) && doc.has_rendered()
        };
        if unchanged {
            self.rerender_in_place(doc, theme, mount).await
        } else {
            self.render_pass(doc, html, theme, mount).await
        }
    }

    /// Load `html` into `doc` and render every diagram block into its slot.
    pub async fn render_pass(
        &self,
        doc: &SharedDocument,
        html: &str,
        theme: &'static ThemeData,
        mount: &MountFlag,
    ) -> PassOutcome {
        if !mount.is_mounted() {
            return PassOutcome::new(PassKind::Full);
        }
        let slots = doc.lock().load(html);
        tracing::debug!(diagrams = slots.len(), theme = theme.id, "Full diagram pass");
        self.fill_slots(PassKind::Full, doc, slots, theme, mount).await
    }

    /// Re-render every diagram currently in `doc` for `theme`.
    ///
    /// Existing SVG stays visible until its replacement is ready.
    pub async fn rerender_in_place(
        &self,
        doc: &SharedDocument,
        theme: &'static ThemeData,
        mount: &MountFlag,
    ) -> PassOutcome {
        if !mount.is_mounted() {
            return PassOutcome::new(PassKind::InPlace);
        }
        let slots = doc.lock().slots();
        tracing::debug!(diagrams = slots.len(), theme = theme.id, "In-place diagram pass");
        self.fill_slots(PassKind::InPlace, doc, slots, theme, mount).await
    }

    async fn fill_slots(
        &self,
        kind: PassKind,
        doc: &SharedDocument,
        slots: Vec<(SlotHandle, DiagramBlock)>,
        theme: &'static ThemeData,
        mount: &MountFlag,
    ) -> PassOutcome {
        let writes = slots
            .into_iter()
            .map(|(handle, block)| self.fill_slot(doc, handle, block, theme, mount));

        let mut outcome = PassOutcome::new(kind);
        for result in join_all(writes).await {
            match result {
                WriteResult::Rendered => outcome.rendered += 1,
                WriteResult::Failed => outcome.failed += 1,
                WriteResult::Discarded => outcome.discarded += 1,
            }
        }
        outcome
    }

    async fn fill_slot(
        &self,
        doc: &SharedDocument,
        handle: SlotHandle,
        block: DiagramBlock,
        theme: &'static ThemeData,
        mount: &MountFlag,
    ) -> WriteResult {
        if !mount.is_mounted() {
            return WriteResult::Discarded;
        }

        let result = self
            .render_diagram(&block.code, block.language, theme)
            .await;

        if !mount.is_mounted() {
            return WriteResult::Discarded;
        }

        let (state, written) = match result {
            Ok(svg) => (SlotState::Rendered { svg }, WriteResult::Rendered),
            Err(e) => {
                tracing::warn!(index = block.index, error = %e, "Diagram rendering failed");
                (
                    SlotState::Failed {
                        message: e.to_string(),
                    },
                    WriteResult::Failed,
                )
            }
        };

        match doc.lock().replace(handle, state) {
            Ok(()) => written,
            Err(stale) => {
                tracing::debug!(index = block.index, %stale, "Dropped result for superseded pass");
                WriteResult::Discarded
            }
        }
    }
}
