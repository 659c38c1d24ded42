//! Fetch command - route one request through the cache

use crate::cli::args::FetchArgs;
use crate::cli::commands::build_worker;
use crate::config::Config;
use crate::error::PrecacheResult;
use crate::manifest::canonical_url;
use crate::net::Request;
use crate::worker::{RouteOutcome, ServeSource};
use console::style;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> PrecacheResult<()> {
    let worker = build_worker(config, args.manifest.as_deref()).await?;
    let origin = config.origin_url()?;

    let url = if args.path.starts_with("http://") || args.path.starts_with("https://") {
        args.path.clone()
    } else if args.path == "/" {
        canonical_url(&origin, "/")
    } else {
        canonical_url(&origin, args.path.trim_start_matches('/'))
    };

    match worker.handle_fetch(&Request::get(&url)).await? {
        RouteOutcome::Served { response, source } => {
            let source_label = match source {
                ServeSource::Cache => style("cache").green(),
                ServeSource::Network => style("network").cyan(),
            };
            println!(
                "{} {} served from {} (HTTP {}, {} bytes)",
                style("✓").green(),
                url,
                source_label,
                response.status,
                response.body.len()
            );
            if let Some(content_type) = response.header("content-type") {
                println!("  content-type: {}", content_type);
            }
        }
        RouteOutcome::Passthrough => {
            println!(
                "{} {} is not a tracked resource; the request passes through",
                style("-").dim(),
                url
            );
        }
    }

    Ok(())
}
