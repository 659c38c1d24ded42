//! Shell prefetch (install phase)
//!
//! Stages every shell resource into the temp store with cache-bypassing
//! fetches. The shell set is all-or-nothing: nothing is committed unless
//! every fetch returned an ok response, so a failed install leaves whatever
//! deployment was previously active fully in control.

use crate::error::{PrecacheError, PrecacheResult};
use crate::manifest::canonical_url;
use crate::net::{FetchMode, Fetcher};
use crate::store::{Store, StoreProvider, TEMP_STORE};
use futures_util::future::try_join_all;
use tracing::debug;

pub(crate) async fn prefetch_shell(
    stores: &dyn StoreProvider,
    fetcher: &dyn Fetcher,
    origin: &str,
    shell: &[String],
) -> PrecacheResult<usize> {
    let temp = stores.open(TEMP_STORE).await?;

    let fetches = shell.iter().map(|path| {
        let url = canonical_url(origin, path);
        async move {
            let response = fetcher
                .fetch(&url, FetchMode::Reload)
                .await
                .map_err(|e| PrecacheError::ShellPrefetch {
                    path: path.clone(),
                    source: Box::new(e),
                })?;
            if !response.ok() {
                return Err(PrecacheError::ShellPrefetch {
                    path: path.clone(),
                    source: Box::new(PrecacheError::HttpStatus {
                        url: url.clone(),
                        status: response.status,
                    }),
                });
            }
            debug!("Staged shell resource {}", path);
            Ok((url, response))
        }
    });

    // Commit only once the whole set fetched successfully.
    let staged = try_join_all(fetches).await?;
    for (url, response) in &staged {
        temp.put(url, response).await?;
    }
    Ok(staged.len())
}
