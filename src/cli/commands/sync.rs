//! Sync command - install and activate the configured deployment

use crate::cli::args::SyncArgs;
use crate::cli::commands::{build_worker, phase_spinner};
use crate::config::Config;
use crate::error::PrecacheResult;
use console::style;

/// Execute the sync command
pub async fn execute(args: SyncArgs, config: &Config) -> PrecacheResult<()> {
    let worker = build_worker(config, args.manifest.as_deref()).await?;

    let spinner = phase_spinner("Staging shell resources...");
    let installed = worker.handle_install().await;
    spinner.finish_and_clear();
    installed?;
    println!("{} Shell staged", style("✓").green());

    let spinner = phase_spinner("Reconciling content store...");
    let activated = worker.handle_activate().await;
    spinner.finish_and_clear();
    let summary = activated?;

    if summary.cold_start {
        println!(
            "{} Activated from a cold start: {} resources installed",
            style("✓").green(),
            summary.installed
        );
    } else {
        println!(
            "{} Activated: {} preserved, {} evicted, {} installed",
            style("✓").green(),
            summary.preserved,
            summary.evicted,
            summary.installed
        );
    }
    println!("  Worker instance {}", style(worker.instance()).dim());

    Ok(())
}
