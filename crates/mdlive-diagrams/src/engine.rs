//! The diagram engine seam.

use mdlive_renderer::ThemeData;

use crate::language::DiagramLanguage;

/// One diagram to render.
#[derive(Debug, Clone)]
pub struct DiagramRequest {
    pub source: String,
    pub language: DiagramLanguage,
    pub theme: &'static ThemeData,
}

/// Engine failure. Cloneable so one initialization result can be shared by
/// every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("engine unavailable: {0}")]
    Unavailable(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("{0}")]
    Other(String),
}

/// A diagram rendering backend.
///
/// `initialize` configures the engine for a theme and may be expensive;
/// [`DiagramEngineState`](crate::DiagramEngineState) guarantees it is never
/// called concurrently and only when the theme changes.
pub trait DiagramEngine: Send + Sync + 'static {
    fn initialize(
        &self,
        theme: &'static ThemeData,
    ) -> impl Future<Output = Result<(), EngineError>> + Send;

    /// Render one diagram to SVG markup.
    fn render(
        &self,
        request: &DiagramRequest,
    ) -> impl Future<Output = Result<String, EngineError>> + Send;
}

/// Failure of a single diagram.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiagramError {
    #[error("initialization failed: {0}")]
    Init(EngineError),
    #[error("{0}")]
    Render(EngineError),
    #[error("SVG sanitization failed: {0}")]
    Sanitize(String),
}
