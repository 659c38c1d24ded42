//! Request routing
//!
//! Decides per intercepted request whether the cache answers at all, and if
//! so with which strategy. Only GETs for tracked resources are handled;
//! everything else passes through to the normal network path. The entry
//! page is served network-first so a reachable server always wins over a
//! possibly stale cached index; every other resource is cache-first with
//! lazy fill.

use crate::error::PrecacheResult;
use crate::manifest::{canonical_url, resource_key, Manifest, ROOT_KEY};
use crate::net::{FetchMode, Fetcher, Request};
use crate::store::{Store, StoreProvider, CONTENT_STORE};
use tracing::debug;

/// Where a routed response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeSource {
    Cache,
    Network,
}

/// Result of routing one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The cache manager answered the request
    Served {
        response: crate::store::CachedResponse,
        source: ServeSource,
    },
    /// Not a tracked asset; the normal network path takes over
    Passthrough,
}

pub(crate) async fn route(
    stores: &dyn StoreProvider,
    fetcher: &dyn Fetcher,
    origin: &str,
    manifest: &Manifest,
    request: &Request,
) -> PrecacheResult<RouteOutcome> {
    if !request.method.is_get() {
        return Ok(RouteOutcome::Passthrough);
    }
    let Some(key) = resource_key(origin, &request.url) else {
        return Ok(RouteOutcome::Passthrough);
    };
    if !manifest.contains(&key) {
        return Ok(RouteOutcome::Passthrough);
    }

    if key == ROOT_KEY {
        network_first(stores, fetcher, origin, &key, request).await
    } else {
        cache_first(stores, fetcher, origin, &key, request).await
    }
}

/// Serve from cache, lazily filling on a miss
///
/// A miss falls back to a live fetch of the caller's original URL; an ok
/// response is stored under the canonical key before being returned. A
/// failed live fetch propagates with no further fallback.
async fn cache_first(
    stores: &dyn StoreProvider,
    fetcher: &dyn Fetcher,
    origin: &str,
    key: &str,
    request: &Request,
) -> PrecacheResult<RouteOutcome> {
    let content = stores.open(CONTENT_STORE).await?;
    let canonical = canonical_url(origin, key);

    if let Some(hit) = content.get(&canonical).await? {
        debug!("Cache hit for {}", key);
        return Ok(RouteOutcome::Served {
            response: hit,
            source: ServeSource::Cache,
        });
    }

    debug!("Cache miss for {}, fetching", key);
    let response = fetcher.fetch(&request.url, FetchMode::Normal).await?;
    if response.ok() {
        content.put(&canonical, &response).await?;
    }
    Ok(RouteOutcome::Served {
        response,
        source: ServeSource::Network,
    })
}

/// Serve the entry page network-first
///
/// A live ok response refreshes the cache and wins. On failure (transport
/// fault or non-ok status) the cached entry is served when one exists;
/// otherwise the original failure propagates.
async fn network_first(
    stores: &dyn StoreProvider,
    fetcher: &dyn Fetcher,
    origin: &str,
    key: &str,
    request: &Request,
) -> PrecacheResult<RouteOutcome> {
    let content = stores.open(CONTENT_STORE).await?;
    let canonical = canonical_url(origin, key);

    match fetcher.fetch(&request.url, FetchMode::Normal).await {
        Ok(response) if response.ok() => {
            content.put(&canonical, &response).await?;
            Ok(RouteOutcome::Served {
                response,
                source: ServeSource::Network,
            })
        }
        Ok(response) => {
            debug!("Entry page fetch returned {}, trying cache", response.status);
            match content.get(&canonical).await? {
                Some(hit) => Ok(RouteOutcome::Served {
                    response: hit,
                    source: ServeSource::Cache,
                }),
                None => Ok(RouteOutcome::Served {
                    response,
                    source: ServeSource::Network,
                }),
            }
        }
        Err(err) => {
            debug!("Entry page unreachable, trying cache: {}", err);
            match content.get(&canonical).await? {
                Some(hit) => Ok(RouteOutcome::Served {
                    response: hit,
                    source: ServeSource::Cache,
                }),
                None => Err(err),
            }
        }
    }
}
