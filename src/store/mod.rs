//! Named cache stores
//!
//! A store is a persistent key-value map from request URL (or sentinel key)
//! to a cached response. Three logical stores back the cache manager:
//!
//! | Store | Role |
//! |-------|------|
//! | temp | Staging area filled during install, drained at activation |
//! | content | Durable store answering runtime traffic |
//! | manifest | Single snapshot entry from the last successful activation |
//!
//! Providers guarantee atomic single-entry put/delete/get; whole-store
//! deletion is the only bulk operation. The provider is injected so tests
//! run against [`memory::MemoryStores`] while the CLI uses
//! [`disk::DiskStores`].

pub mod disk;
pub mod memory;

pub use disk::DiskStores;
pub use memory::MemoryStores;

use crate::error::PrecacheResult;
use async_trait::async_trait;

/// Durable store backing runtime traffic
pub const CONTENT_STORE: &str = "precache-content";
/// Staging store populated during install, deleted during activation
pub const TEMP_STORE: &str = "precache-temp";
/// Metadata store holding exactly one manifest snapshot
pub const MANIFEST_STORE: &str = "precache-manifest";
/// Key of the snapshot entry inside [`MANIFEST_STORE`]
pub const SNAPSHOT_KEY: &str = "manifest";

/// A cached response: status, headers, body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Shorthand for a bodied 200 response without headers
    pub fn ok_with_body(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, Vec::new(), body.into())
    }

    /// Whether the status is in the ok class (2xx)
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A single named store
#[async_trait]
pub trait Store: Send + Sync {
    /// Enumerate all entry keys
    async fn keys(&self) -> PrecacheResult<Vec<String>>;

    /// Look up an entry
    async fn get(&self, key: &str) -> PrecacheResult<Option<CachedResponse>>;

    /// Insert or replace an entry
    async fn put(&self, key: &str, response: &CachedResponse) -> PrecacheResult<()>;

    /// Remove an entry, returning whether it existed
    async fn delete(&self, key: &str) -> PrecacheResult<bool>;
}

/// Factory and lifecycle manager for named stores
#[async_trait]
pub trait StoreProvider: Send + Sync {
    /// Open a store, creating it if missing
    async fn open(&self, name: &str) -> PrecacheResult<Box<dyn Store>>;

    /// Delete a store and all its entries (a no-op when absent)
    async fn delete(&self, name: &str) -> PrecacheResult<()>;

    /// Whether a store currently exists
    async fn has(&self, name: &str) -> PrecacheResult<bool>;
}
