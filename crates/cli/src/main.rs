//! Compass CLI: the main entry point.
//!
//! Commands:
//! - `serve`    : Start the HTTP gateway
//! - `ask`      : Run one chat turn from the terminal
//! - `explain`  : Show how a prompt would be classified and formatted
//! - `index`    : Build a retrieval index from a folder of documents
//! - `status`   : Show the effective configuration
//! - `doctor`   : Diagnose setup problems
//! - `onboard`  : Write a default config file

use clap::{Parser, Subcommand};
use compass_core::DeploymentMode;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "compass",
    about = "Compass: context-aware chat orchestrator",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the deployment mode (direct or retrieval)
        #[arg(short, long)]
        mode: Option<DeploymentMode>,
    },

    /// Ask a single question
    Ask {
        prompt: String,

        /// Model to use for this request
        #[arg(short, long)]
        model: Option<String>,

        /// JSON file with the caller profile
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Override the deployment mode (direct or retrieval)
        #[arg(long)]
        mode: Option<DeploymentMode>,
    },

    /// Print the classification and backend request for a prompt without sending it
    Explain {
        prompt: String,

        /// JSON file with the caller profile
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Override the deployment mode (direct or retrieval)
        #[arg(long)]
        mode: Option<DeploymentMode>,
    },

    /// Build a retrieval index from `.md` / `.txt` documents
    Index {
        docs_dir: PathBuf,

        /// Output directory (defaults to retrieval.persist_dir)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show the effective configuration
    Status,

    /// Diagnose setup problems
    Doctor,

    /// Write a default configuration file
    Onboard,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port, mode } => commands::serve::run(port, mode).await?,
        Commands::Ask {
            prompt,
            model,
            profile,
            mode,
        } => commands::ask::run(prompt, model, profile, mode).await?,
        Commands::Explain {
            prompt,
            profile,
            mode,
        } => commands::explain::run(prompt, profile, mode).await?,
        Commands::Index { docs_dir, out } => commands::index::run(docs_dir, out).await?,
        Commands::Status => commands::status::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Onboard => commands::onboard::run().await?,
    }

    Ok(())
}
