//! Precache - offline resource cache manager
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use precache::cli::{Cli, Commands};
use precache::config::ConfigManager;
use precache::error::PrecacheResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> PrecacheResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("precache=warn"),
        1 => EnvFilter::new("precache=info"),
        _ => EnvFilter::new("precache=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let manager = match cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };

    // Init writes the config; it never loads one.
    if let Commands::Init(args) = cli.command {
        return precache::cli::commands::init(args, &manager).await;
    }

    let config = manager.load().await?;

    match cli.command {
        Commands::Init(_) => unreachable!("handled above"),
        Commands::Sync(args) => precache::cli::commands::sync(args, &config).await,
        Commands::Download(args) => precache::cli::commands::download(args, &config).await,
        Commands::Status => precache::cli::commands::status(&config).await,
        Commands::Fetch(args) => precache::cli::commands::fetch(args, &config).await,
    }
}
