//! umlpage CLI - incremental diagram page renderer.
//!
//! Provides commands for:
//! - `render`: Render a diagram document to image files
//! - `titles`: Print the page titles of a diagram document
//! - `watch`: Re-render a document whenever it changes

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{RenderArgs, TitlesArgs, WatchArgs};
use output::Output;

/// umlpage - incremental diagram page renderer.
#[derive(Parser)]
#[command(name = "umlpage", version, about)]
struct Cli {
    /// Enable verbose output (render timing and cache logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a document to image files.
    Render(RenderArgs),
    /// Print the title of every page.
    Titles(TitlesArgs),
    /// Re-render a document on every change.
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
        Commands::Render(args) => args.execute(),
        Commands::Titles(args) => args.execute(),
        Commands::Watch(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
