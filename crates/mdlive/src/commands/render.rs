//! `mdlive render` command implementation.

use std::path::PathBuf;

use clap::Args;

use super::{RenderOptions, read_markdown, write_file};
use crate::document::{DocumentRenderer, resolve_theme};
use crate::error::CliError;
use crate::output::{Output, write_stdout};

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Markdown file to render.
    file: PathBuf,

    /// Write the page to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit only the themed HTML fragment, without the page shell.
    #[arg(long)]
    fragment: bool,

    #[command(flatten)]
    options: RenderOptions,
}

impl RenderArgs {
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.options.load_config(None)?;
        let theme = resolve_theme(&config.render.theme)?;
        let markdown = read_markdown(&self.file)?;

        let renderer = DocumentRenderer::from_config(&config);
        let rendered = renderer.render(&markdown, theme).await?;
        for warning in &rendered.result.warnings {
            output.warning(&format!("Warning: {warning}"));
        }
        if rendered.failed_diagrams > 0 {
            output.warning(&format!(
                "{} diagram(s) failed to render",
                rendered.failed_diagrams
            ));
        }

        let html = if self.fragment {
            rendered.body
        } else {
            let fallback = self.file.display().to_string();
            rendered.page(&fallback, renderer.tracker())
        };

        match &self.output {
            Some(path) => {
                write_file(path, &html)?;
                output.success(&format!("Rendered {}", path.display()));
            }
            None => write_stdout(&html)?,
        }
        Ok(())
    }
}
