//! CLI command implementations

pub mod download;
pub mod fetch;
pub mod init;
pub mod status;
pub mod sync;

pub use download::execute as download;
pub use fetch::execute as fetch;
pub use init::execute as init;
pub use status::execute as status;
pub use sync::execute as sync;

use crate::audit::AuditLog;
use crate::config::{Config, ConfigManager};
use crate::error::{PrecacheError, PrecacheResult};
use crate::manifest::DeployManifest;
use crate::net::HttpFetcher;
use crate::store::DiskStores;
use crate::worker::CacheWorker;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Build a worker from the loaded config and an optional manifest override
pub(crate) async fn build_worker(
    config: &Config,
    manifest_override: Option<&Path>,
) -> PrecacheResult<CacheWorker> {
    let origin = config.origin_url()?;

    let manifest_path = manifest_override
        .or(config.origin.manifest.as_deref())
        .ok_or_else(|| {
            PrecacheError::User(
                "No deploy manifest configured. Set origin.manifest or pass --manifest.".to_string(),
            )
        })?;
    let deploy = DeployManifest::from_file(manifest_path).await?;
    let (manifest, shell) = deploy.into_parts();

    let state_dir = ConfigManager::effective_state_dir(config);
    let stores = Arc::new(DiskStores::new(ConfigManager::stores_dir(&state_dir)));
    let audit = AuditLog::new(
        ConfigManager::audit_log_path(&state_dir),
        config.general.audit_log,
    );

    Ok(
        CacheWorker::new(manifest, shell, origin, stores, Arc::new(HttpFetcher::new()))
            .with_audit(audit)
            .with_download_concurrency(config.cache.download_concurrency),
    )
}

/// Spinner shown during network-heavy phases (hidden when not a terminal)
pub(crate) fn phase_spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}
