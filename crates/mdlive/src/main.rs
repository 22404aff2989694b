//! mdlive CLI - live Markdown documents.
//!
//! Provides commands for:
//! - `render`: Render a Markdown file to a themed HTML page
//! - `toc`: Print a document outline
//! - `watch`: Re-render a file or URL whenever it changes

mod commands;
mod document;
mod error;
mod output;
mod page;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{RenderArgs, TocArgs, WatchArgs};
use output::Output;

/// mdlive - live Markdown documents.
#[derive(Parser)]
#[command(name = "mdlive", version, about)]
struct Cli {
    /// Enable verbose output (diagram and change detection logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a Markdown file to HTML.
    Render(RenderArgs),
    /// Print the heading outline of a Markdown file.
    Toc(TocArgs),
    /// Render a document and re-render it whenever it changes.
    Watch(WatchArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Toc(args) => args.execute(),
        Commands::Render(args) => {
            let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
            rt.block_on(args.execute())
        }
        Commands::Watch(args) => {
            let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
            rt.block_on(args.execute())
        }
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
