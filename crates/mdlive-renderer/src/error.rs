//! Error types for the render pipeline.

/// Markdown parsing failure.
///
/// The pipeline recovers from these by rendering the source as escaped text.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("document is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
    #[error("{0}")]
    Other(String),
}

/// HTML sanitization failure.
#[derive(Debug, thiserror::Error)]
pub enum SanitizeError {
    #[error("HTML rewriting failed: {0}")]
    Rewrite(#[from] lol_html::errors::RewritingError),
    #[error("{0}")]
    Other(String),
}

/// Error returned by [`render`](crate::render).
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Sanitizer failed: {0}")]
    Sanitize(#[from] SanitizeError),
}
