//! `mdlive watch` command implementation.

use std::path::PathBuf;

use clap::Args;
use mdlive_reload::{ChangeDetector, ResourceFingerprinter, TargetPolicy, digest};
use tokio::sync::oneshot;

use super::{RenderOptions, write_file};
use crate::document::{DocumentRenderer, resolve_theme};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the watch command.
#[derive(Args)]
pub(crate) struct WatchArgs {
    /// Markdown file path, `file://` URL or `http(s)://` URL.
    target: String,

    /// Page to (re)write on every change.
    #[arg(short, long)]
    output: PathBuf,

    /// Polling interval in milliseconds (overrides config, minimum 1000).
    #[arg(short, long)]
    interval_ms: Option<u64>,

    #[command(flatten)]
    options: RenderOptions,
}

impl WatchArgs {
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.options.load_config(self.interval_ms)?;
        let theme = resolve_theme(&config.render.theme)?;

        let fingerprinter = ResourceFingerprinter::new(TargetPolicy {
            allowed_hosts: config.reload.allowed_hosts.clone(),
        });
        let renderer = DocumentRenderer::from_config(&config);

        loop {
            let bytes = fingerprinter.fetch_bytes(&self.target).await?;
            let markdown = String::from_utf8_lossy(&bytes);
            let rendered = renderer.render(&markdown, theme).await?;
            for warning in &rendered.result.warnings {
                output.warning(&format!("Warning: {warning}"));
            }
            write_file(
                &self.output,
                &rendered.page(&self.target, renderer.tracker()),
            )?;
            output.success(&format!("Rendered {}", self.output.display()));

            if !config.reload.enabled {
                output.info("Change detection disabled; exiting");
                return Ok(());
            }

            // Poll against the bytes just rendered, so an edit made since is still seen.
            let detector = ChangeDetector::new(fingerprinter.clone(), self.target.as_str());
            let (changed_tx, changed_rx) = oneshot::channel();
            let interval = detector.start_with_fingerprint(
                digest(&bytes),
                config.reload.interval(),
                move || {
                    let _ = changed_tx.send(());
                },
            )?;
            output.info(&format!(
                "Watching {} every {}ms (Ctrl+C to stop)",
                self.target,
                interval.as_millis()
            ));

            tokio::select! {
                changed = changed_rx => {
                    if changed.is_err() {
                        // Callback dropped without firing: the detector stopped on a fetch error.
                        return Err(CliError::Watch(format!(
                            "Change detection for {} stopped after a fetch failure",
                            self.target
                        )));
                    }
                    output.info("Change detected, re-rendering");
                }
                _ = tokio::signal::ctrl_c() => {
                    detector.stop();
                    output.info("Stopped");
                    return Ok(());
                }
            }
        }
    }
}
