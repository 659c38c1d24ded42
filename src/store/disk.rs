//! On-disk store provider
//!
//! Each named store is a directory under the stores root. An entry is a
//! metadata JSON file plus a body file sharing a stem derived from the
//! SHA-256 of the entry key, so arbitrary URLs map to safe file names.
//! The body is written before the metadata; an entry without readable
//! metadata is treated as absent, so a torn write degrades to a cache miss
//! rather than an error.

use crate::error::{PrecacheError, PrecacheResult};
use crate::store::{CachedResponse, Store, StoreProvider};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

const META_SUFFIX: &str = ".meta.json";
const BODY_SUFFIX: &str = ".body";

/// Store provider persisting entries under a root directory
#[derive(Debug, Clone)]
pub struct DiskStores {
    root: PathBuf,
}

impl DiskStores {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn store_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[async_trait]
impl StoreProvider for DiskStores {
    async fn open(&self, name: &str) -> PrecacheResult<Box<dyn Store>> {
        let dir = self.store_dir(name);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| PrecacheError::io(format!("creating store directory {}", dir.display()), e))?;
        Ok(Box::new(DiskStore { dir }))
    }

    async fn delete(&self, name: &str) -> PrecacheResult<()> {
        let dir = self.store_dir(name);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!("Deleted store {}", name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PrecacheError::io(
                format!("deleting store directory {}", dir.display()),
                e,
            )),
        }
    }

    async fn has(&self, name: &str) -> PrecacheResult<bool> {
        Ok(self.store_dir(name).is_dir())
    }
}

/// Entry metadata persisted next to the body file
#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    key: String,
    status: u16,
    headers: Vec<(String, String)>,
    stored_at: DateTime<Utc>,
}

struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    fn stem(key: &str) -> String {
        hex::encode(Sha256::digest(key.as_bytes()))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}{META_SUFFIX}", Self::stem(key)))
    }

    fn body_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}{BODY_SUFFIX}", Self::stem(key)))
    }

    async fn read_meta(path: &Path) -> Option<EntryMeta> {
        let content = match fs::read(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Unreadable store entry {}: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_slice(&content) {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!("Corrupt store entry {}: {}", path.display(), e);
                None
            }
        }
    }
}

#[async_trait]
impl Store for DiskStore {
    async fn keys(&self) -> PrecacheResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(PrecacheError::io(
                    format!("reading store directory {}", self.dir.display()),
                    e,
                ))
            }
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PrecacheError::io("reading store entry", e))?
        {
            let path = entry.path();
            if !path.to_string_lossy().ends_with(META_SUFFIX) {
                continue;
            }
            if let Some(meta) = Self::read_meta(&path).await {
                keys.push(meta.key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn get(&self, key: &str) -> PrecacheResult<Option<CachedResponse>> {
        let Some(meta) = Self::read_meta(&self.meta_path(key)).await else {
            return Ok(None);
        };

        let body = match fs::read(self.body_path(key)).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Missing body for cached entry {}: {}", key, e);
                return Ok(None);
            }
        };

        Ok(Some(CachedResponse::new(meta.status, meta.headers, body)))
    }

    async fn put(&self, key: &str, response: &CachedResponse) -> PrecacheResult<()> {
        let meta = EntryMeta {
            key: key.to_string(),
            status: response.status,
            headers: response.headers.clone(),
            stored_at: Utc::now(),
        };

        // Body first; the metadata file is the commit marker.
        fs::write(self.body_path(key), &response.body)
            .await
            .map_err(|e| PrecacheError::io(format!("writing body for {key}"), e))?;

        let meta_json = serde_json::to_vec(&meta)?;
        fs::write(self.meta_path(key), meta_json)
            .await
            .map_err(|e| PrecacheError::io(format!("writing metadata for {key}"), e))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> PrecacheResult<bool> {
        let existed = match fs::remove_file(self.meta_path(key)).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                return Err(PrecacheError::io(format!("deleting metadata for {key}"), e))
            }
        };
        match fs::remove_file(self.body_path(key)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(PrecacheError::io(format!("deleting body for {key}"), e)),
        }
        Ok(existed)
    }
}
