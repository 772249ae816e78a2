//! Product Studio CLI - three marketing shots from one product photo.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod views;

use commands::GenerateCommand;

/// Product Studio CLI.
///
/// Turns a single product photo into three e-commerce shots (frontal master,
/// hero perspective, detail view) using a Gemini image model.
///
/// The API key is read from API_KEY, GEMINI_API_KEY or GOOGLE_API_KEY.
#[derive(Parser)]
#[command(name = "product-studio")]
#[command(about = "Gemini-backed product photo studio")]
#[command(version)]
pub struct Cli {
    /// Verbose logging (same as RUST_LOG=product_studio=debug)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the three angle shots for a product photo
    Generate(GenerateCommand),
    /// List the built-in style presets
    Presets,
    /// List the camera angles that will be rendered
    Angles,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "product_studio=debug"
    } else {
        "product_studio=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Generate(cmd) => cmd.run().await,
        Commands::Presets => {
            commands::list_presets();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Angles => {
            commands::list_angles();
            Ok(ExitCode::SUCCESS)
        }
    }
}
