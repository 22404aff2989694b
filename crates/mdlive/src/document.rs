//! Rendering a Markdown document with its diagrams.

use mdlive_config::Config;
use mdlive_diagrams::{DiagramEngine, DiagramRenderer, KrokiEngine, MountFlag, SharedDocument};
use mdlive_renderer::{Pipeline, RenderResult, ThemeData};
use mdlive_tracker::ObservationZone;

use crate::error::CliError;
use crate::page::{TrackerSettings, document_title, render_page};

/// Resolve a built-in theme by ID.
pub(crate) fn resolve_theme(id: &str) -> Result<&'static ThemeData, CliError> {
    ThemeData::find(id).ok_or_else(|| {
        let available: Vec<_> = mdlive_renderer::BUILTIN_THEMES
            .iter()
            .map(|theme| theme.id)
            .collect();
        CliError::Validation(format!(
            "Unknown theme '{id}' (available: {})",
            available.join(", ")
        ))
    })
}

/// Render pipeline configured from `[render]`.
pub(crate) fn pipeline(config: &Config) -> Pipeline {
    let pipeline = Pipeline::new().with_gfm(config.render.gfm);
    match config.render.max_input_bytes {
        Some(limit) => pipeline.with_max_input_bytes(limit),
        None => pipeline,
    }
}

/// A rendered document ready to be written out.
pub(crate) struct RenderedDocument {
    pub result: RenderResult,
    /// Themed HTML with diagrams filled in.
    pub body: String,
    pub failed_diagrams: usize,
}

impl RenderedDocument {
    /// The body wrapped in a standalone page.
    pub(crate) fn page(&self, fallback_title: &str, tracker: TrackerSettings) -> String {
        render_page(
            document_title(&self.result, fallback_title),
            &self.body,
            &self.result.toc_items,
            tracker,
        )
    }
}

/// Renders documents with the configured pipeline and diagram engine.
///
/// One renderer keeps its diagram document across calls. Diagrams see the
/// document before the theme container is applied, so re-rendering the same
/// Markdown in a new theme only re-skins the diagrams.
pub(crate) struct DocumentRenderer<E = KrokiEngine> {
    pipeline: Pipeline,
    diagrams: Option<DiagramRenderer<E>>,
    doc: SharedDocument,
    mount: MountFlag,
    tracker: TrackerSettings,
}

impl DocumentRenderer {
    pub(crate) fn from_config(config: &Config) -> Self {
        let diagrams = config.diagrams.kroki_url.as_ref().map(|url| {
            DiagramRenderer::new(KrokiEngine::with_timeout(
                url.clone(),
                config.diagrams.timeout(),
            ))
        });
        Self::with_diagrams(config, diagrams)
    }
}

impl<E: DiagramEngine> DocumentRenderer<E> {
    fn with_diagrams(config: &Config, diagrams: Option<DiagramRenderer<E>>) -> Self {
        Self {
            pipeline: pipeline(config),
            diagrams,
            doc: SharedDocument::new(),
            mount: MountFlag::new(),
            tracker: TrackerSettings {
                zone: ObservationZone::with_header_offset(config.tracker.header_offset),
                discovery_timeout_ms: config.tracker.discovery_timeout_ms,
            },
        }
    }

    pub(crate) fn tracker(&self) -> TrackerSettings {
        self.tracker
    }

    pub(crate) async fn render(
        &self,
        markdown: &str,
        theme: &'static ThemeData,
    ) -> Result<RenderedDocument, CliError> {
        let result = self.pipeline.render(markdown, theme)?;

        let Some(diagrams) = &self.diagrams else {
            let body = result.html.clone();
            return Ok(RenderedDocument {
                result,
                body,
                failed_diagrams: 0,
            });
        };

        let outcome = diagrams
            .process(&self.doc, &result.body, theme, &self.mount)
            .await;
        let engine = diagrams.state().snapshot();
        tracing::info!(
            kind = ?outcome.kind,
            rendered = outcome.rendered,
            failed = outcome.failed,
            engine_theme = engine.initialized_theme,
            "Diagrams processed"
        );
        Ok(RenderedDocument {
            body: theme.wrap(&self.doc.to_html()),
            result,
            failed_diagrams: outcome.failed,
        })
    }
}
