//! `mdlive toc` command implementation.

use std::path::PathBuf;

use clap::Args;

use super::{RenderOptions, read_markdown};
use crate::document::pipeline;
use crate::error::CliError;
use crate::output::write_stdout;
use crate::page::toc_text;

/// Arguments for the toc command.
#[derive(Args)]
pub(crate) struct TocArgs {
    /// Markdown file to outline.
    file: PathBuf,

    /// Print the outline as JSON.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    options: RenderOptions,
}

impl TocArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let config = self.options.load_config(None)?;
        let markdown = read_markdown(&self.file)?;
        let toc = pipeline(&config).outline(&markdown)?;

        if self.json {
            write_stdout(&serde_json::to_string_pretty(&toc)?)?;
        } else {
            let text = toc_text(&toc);
            write_stdout(text.trim_end())?;
        }
        Ok(())
    }
}
