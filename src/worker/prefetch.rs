//! Bulk prefetch (full offline enablement)
//!
//! Fetches every manifest resource not already present in the content
//! store. The batch either commits in full or not at all: every fetch must
//! return an ok response before the first entry is written.

use crate::error::{PrecacheError, PrecacheResult};
use crate::manifest::{canonical_url, resource_key, Manifest};
use crate::net::{FetchMode, Fetcher};
use crate::store::{CachedResponse, Store, StoreProvider, CONTENT_STORE};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashSet;
use tracing::{debug, info};

pub(crate) async fn download_offline(
    stores: &dyn StoreProvider,
    fetcher: &dyn Fetcher,
    origin: &str,
    manifest: &Manifest,
    concurrency: usize,
) -> PrecacheResult<usize> {
    let content = stores.open(CONTENT_STORE).await?;

    let mut present = HashSet::new();
    for url in content.keys().await? {
        if let Some(path) = resource_key(origin, &url) {
            present.insert(path);
        }
    }

    let missing: Vec<&str> = manifest
        .paths()
        .filter(|path| !present.contains(*path))
        .collect();
    if missing.is_empty() {
        debug!("Content store already holds every manifest resource");
        return Ok(0);
    }
    info!("Prefetching {} missing resources", missing.len());

    let fetched: Vec<(String, CachedResponse)> = stream::iter(missing.into_iter().map(|path| {
        let url = canonical_url(origin, path);
        async move {
            let response = fetcher.fetch(&url, FetchMode::Normal).await?;
            if !response.ok() {
                return Err(PrecacheError::HttpStatus {
                    url,
                    status: response.status,
                });
            }
            Ok((url, response))
        }
    }))
    .buffer_unordered(concurrency.max(1))
    .try_collect()
    .await?;

    for (url, response) in &fetched {
        content.put(url, response).await?;
    }
    Ok(fetched.len())
}
