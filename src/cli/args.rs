//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Precache - offline resource cache manager
///
/// Keeps a local cache of a fingerprinted web deployment in sync across
/// releases and serves tracked resources from it.
#[derive(Parser, Debug)]
#[command(name = "precache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "PRECACHE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a configuration template
    Init(InitArgs),

    /// Install and activate the configured deployment
    Sync(SyncArgs),

    /// Prefetch every manifest resource for full offline use
    Download(DownloadArgs),

    /// Inspect stores and the persisted manifest snapshot
    Status,

    /// Route one request through the cache and report how it was served
    Fetch(FetchArgs),
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the sync command
#[derive(Parser, Debug)]
pub struct SyncArgs {
    /// Deploy manifest path (overrides the configured one)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,
}

/// Arguments for the download command
#[derive(Parser, Debug)]
pub struct DownloadArgs {
    /// Deploy manifest path (overrides the configured one)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Resource path (relative to the origin) or an absolute URL
    pub path: String,

    /// Deploy manifest path (overrides the configured one)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,
}
