//! md2typ CLI - Markdown to Typst report converter.
//!
//! Provides commands for:
//! - `convert`: Convert a markdown file to Typst

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::ConvertArgs;
use output::Output;

/// md2typ - Markdown to Typst report converter.
#[derive(Parser)]
#[command(name = "md2typ", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a markdown file to Typst.
    Convert(ConvertArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = matches!(&cli.command, Commands::Convert(args) if args.verbose);

    // --verbose enables DEBUG level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Convert(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
