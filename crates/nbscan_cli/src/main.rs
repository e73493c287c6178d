//! nbscan CLI - batch job extracting session code from audit logs for static analysis.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "nbscan")]
#[command(about = "Extract notebook session code from audit logs for static analysis", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./nbscan.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Rebuild the code tree from the audit log
    Extract,
    /// Show reconstructed sessions
    Sessions {
        /// Only show sessions of this document id
        #[arg(short, long)]
        document: Option<String>,
        /// Include unresolved sessions
        #[arg(long)]
        all: bool,
    },
    /// Run the analysis engine and triage import on the existing code tree
    Analyze,
    /// Extract, then analyze
    Run,
}

fn main() -> Result<()> {
    // Initialize tracing subscriber
    // Respects RUST_LOG environment variable (e.g., RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Init { force } => commands::init::run(config_path, force),
        Commands::Extract => commands::extract::run(config_path),
        Commands::Sessions { document, all } => {
            commands::sessions::run(config_path, document.as_deref(), all)
        }
        Commands::Analyze => commands::analyze::run(config_path),
        Commands::Run => commands::run::run(config_path),
    };

    if let Err(err) = &result {
        if let Some(hint) = err
            .downcast_ref::<nbscan_core::ScanError>()
            .and_then(|e| e.recovery_suggestion())
        {
            eprintln!("hint: {}", hint);
        }
    }
    result
}
