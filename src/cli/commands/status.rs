//! Status command - inspect stores and the persisted snapshot

use crate::config::{Config, ConfigManager};
use crate::error::PrecacheResult;
use crate::manifest::Manifest;
use crate::store::{
    DiskStores, Store, StoreProvider, CONTENT_STORE, MANIFEST_STORE, SNAPSHOT_KEY, TEMP_STORE,
};
use console::style;

/// Execute the status command
pub async fn execute(config: &Config) -> PrecacheResult<()> {
    let state_dir = ConfigManager::effective_state_dir(config);
    let stores = DiskStores::new(ConfigManager::stores_dir(&state_dir));

    println!("{}", style("Precache Status").bold());
    println!("State directory: {}", state_dir.display());
    println!();

    println!("{:<12} {:<10} {:>8}", "STORE", "STATE", "ENTRIES");
    println!("{}", "-".repeat(32));
    for (label, name) in [
        ("content", CONTENT_STORE),
        ("temp", TEMP_STORE),
        ("manifest", MANIFEST_STORE),
    ] {
        if stores.has(name).await? {
            let count = stores.open(name).await?.keys().await?.len();
            println!("{:<12} {:<10} {:>8}", label, style("present").green(), count);
        } else {
            println!("{:<12} {:<10} {:>8}", label, style("absent").dim(), "-");
        }
    }
    println!();

    let snapshot = if stores.has(MANIFEST_STORE).await? {
        stores.open(MANIFEST_STORE).await?.get(SNAPSHOT_KEY).await?
    } else {
        None
    };

    match snapshot {
        Some(entry) => match Manifest::from_snapshot_json(&entry.body) {
            Ok(manifest) => {
                println!("Snapshot: {} tracked resources", manifest.len());
            }
            Err(e) => {
                println!("Snapshot: {} ({})", style("unreadable").red(), e);
            }
        },
        None => {
            println!("Snapshot: none (no successful activation yet)");
        }
    }

    Ok(())
}
