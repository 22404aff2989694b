//! CLI error types.

use std::path::PathBuf;

use mdlive_config::ConfigError;
use mdlive_reload::{DetectorError, FetchError};
use mdlive_renderer::RenderError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Render(#[from] RenderError),

    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Detector(#[from] DetectorError),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Watch(String),

    #[error("{0}")]
    Validation(String),
}
