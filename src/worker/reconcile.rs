//! Manifest reconciliation (activate phase)
//!
//! Aligns the durable content store with a new deployment's manifest.
//! Entries whose fingerprint is unchanged since the previously persisted
//! snapshot are kept as-is; everything stale, removed, or unaccounted for
//! is evicted. The staged shell is then promoted from the temp store,
//! overwriting whatever reconciliation decided, and the new manifest
//! becomes the snapshot for the next upgrade.
//!
//! Without a prior snapshot there is nothing to diff against, so the
//! content store is rebuilt from scratch: per-entry fingerprints are never
//! inspected on that path.

use crate::error::PrecacheResult;
use crate::manifest::{resource_key, Manifest};
use crate::store::{
    CachedResponse, Store, StoreProvider, CONTENT_STORE, MANIFEST_STORE, SNAPSHOT_KEY, TEMP_STORE,
};
use tracing::{debug, info};

/// Outcome of one reconciliation cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Entries left untouched because their fingerprint did not change
    pub preserved: usize,
    /// Entries deleted as stale, removed, or untracked
    pub evicted: usize,
    /// Entries promoted from the temp store
    pub installed: usize,
    /// Whether the no-snapshot wipe-and-rebuild path ran
    pub cold_start: bool,
}

pub(crate) async fn reconcile(
    stores: &dyn StoreProvider,
    origin: &str,
    manifest: &Manifest,
) -> PrecacheResult<ReconcileSummary> {
    let content = stores.open(CONTENT_STORE).await?;
    let temp = stores.open(TEMP_STORE).await?;
    let manifest_store = stores.open(MANIFEST_STORE).await?;

    let snapshot = manifest_store.get(SNAPSHOT_KEY).await?;
    let mut summary = ReconcileSummary::default();

    let content = match snapshot {
        None => {
            // First run (or a prior failure erased the snapshot): the
            // content store cannot be trusted, discard it wholesale.
            info!("No manifest snapshot found, rebuilding content store");
            stores.delete(CONTENT_STORE).await?;
            summary.cold_start = true;
            stores.open(CONTENT_STORE).await?
        }
        Some(snapshot) => {
            let previous = Manifest::from_snapshot_json(&snapshot.body)?;
            for url in content.keys().await? {
                let stale = match resource_key(origin, &url) {
                    Some(path) => {
                        match (manifest.fingerprint(&path), previous.fingerprint(&path)) {
                            // Unchanged across deployments: reuse without refetch.
                            (Some(new), Some(old)) => new != old,
                            // Removed from the new manifest, or never tracked.
                            _ => true,
                        }
                    }
                    // An entry not belonging to the origin has no business here.
                    None => true,
                };
                if stale {
                    debug!("Evicting stale entry {}", url);
                    content.delete(&url).await?;
                    summary.evicted += 1;
                } else {
                    summary.preserved += 1;
                }
            }
            content
        }
    };

    // Promote the staged shell; temp entries overwrite preserved ones so the
    // shell always reflects the deployment that was just installed.
    for url in temp.keys().await? {
        if let Some(response) = temp.get(&url).await? {
            content.put(&url, &response).await?;
            summary.installed += 1;
        }
    }
    stores.delete(TEMP_STORE).await?;

    // Replace the snapshot: delete the store, recreate, write.
    stores.delete(MANIFEST_STORE).await?;
    let manifest_store = stores.open(MANIFEST_STORE).await?;
    let body = manifest.to_snapshot_json()?;
    manifest_store
        .put(SNAPSHOT_KEY, &CachedResponse::ok_with_body(body))
        .await?;

    info!(
        preserved = summary.preserved,
        evicted = summary.evicted,
        installed = summary.installed,
        cold_start = summary.cold_start,
        "Reconciled content store"
    );
    Ok(summary)
}

/// Destroy all three stores, returning the system to a true first-run state
///
/// The recovery action after an upgrade fault: a cold cache is traded for a
/// guaranteed-consistent one.
pub(crate) async fn wipe_all(stores: &dyn StoreProvider) -> PrecacheResult<()> {
    stores.delete(CONTENT_STORE).await?;
    stores.delete(TEMP_STORE).await?;
    stores.delete(MANIFEST_STORE).await?;
    Ok(())
}
