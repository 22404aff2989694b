//! CLI command implementations.

pub(crate) mod render;
pub(crate) mod toc;
pub(crate) mod watch;

use std::path::{Path, PathBuf};

use clap::Args;
use mdlive_config::{CliSettings, Config};

use crate::error::CliError;

pub(crate) use render::RenderArgs;
pub(crate) use toc::TocArgs;
pub(crate) use watch::WatchArgs;

/// Options shared by commands that render.
#[derive(Args)]
pub(crate) struct RenderOptions {
    /// Path to configuration file (default: auto-discover mdlive.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Theme ID (overrides config).
    #[arg(short, long, env = "MDLIVE_THEME")]
    theme: Option<String>,

    /// Kroki server URL for diagram rendering (overrides config).
    #[arg(long, env = "MDLIVE_KROKI_URL")]
    kroki_url: Option<String>,

    /// Disable GitHub Flavored Markdown extensions.
    #[arg(long)]
    no_gfm: bool,
}

impl RenderOptions {
    fn load_config(&self, interval_ms: Option<u64>) -> Result<Config, CliError> {
        let settings = CliSettings {
            theme: self.theme.clone(),
            gfm: self.no_gfm.then_some(false),
            kroki_url: self.kroki_url.clone(),
            reload_enabled: None,
            interval_ms,
        };
        Ok(Config::load(self.config.as_deref(), Some(&settings))?)
    }
}

fn read_markdown(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, content: &str) -> Result<(), CliError> {
    std::fs::write(path, content).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}
