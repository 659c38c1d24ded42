//! Download command - prefetch every manifest resource

use crate::cli::args::DownloadArgs;
use crate::cli::commands::{build_worker, phase_spinner};
use crate::config::Config;
use crate::error::PrecacheResult;
use console::style;

/// Execute the download command
pub async fn execute(args: DownloadArgs, config: &Config) -> PrecacheResult<()> {
    let worker = build_worker(config, args.manifest.as_deref()).await?;

    let spinner = phase_spinner("Prefetching missing resources...");
    let result = worker.download_offline().await;
    spinner.finish_and_clear();

    match result? {
        0 => println!(
            "{} Cache already holds every tracked resource",
            style("✓").green()
        ),
        fetched => println!(
            "{} Fetched {} resources; the deployment is fully cached",
            style("✓").green(),
            fetched
        ),
    }

    Ok(())
}
