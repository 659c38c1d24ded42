//! Shared test doubles for the worker modules

use crate::error::{PrecacheError, PrecacheResult};
use crate::manifest::{Fingerprint, Manifest};
use crate::net::{FetchMode, Fetcher};
use crate::store::memory::MemoryStores;
use crate::store::{CachedResponse, Store, StoreProvider};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

pub(crate) const ORIGIN: &str = "https://app.example.com";

/// Build a manifest from (path, fingerprint) pairs
pub(crate) fn manifest_of(entries: &[(&str, &str)]) -> Manifest {
    let resources: BTreeMap<String, Fingerprint> = entries
        .iter()
        .map(|(path, fp)| (path.to_string(), Fingerprint::from(*fp)))
        .collect();
    Manifest::from_resources(resources)
}

/// Scripted fetcher recording every call
#[derive(Default)]
pub(crate) struct MockFetcher {
    responses: Mutex<HashMap<String, CachedResponse>>,
    fail: Mutex<HashSet<String>>,
    calls: Mutex<Vec<(String, FetchMode)>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, response: CachedResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    pub fn serve_ok(&self, url: &str, body: &[u8]) {
        self.serve(url, CachedResponse::ok_with_body(body.to_vec()));
    }

    pub fn serve_status(&self, url: &str, status: u16) {
        self.serve(url, CachedResponse::new(status, Vec::new(), Vec::new()));
    }

    /// Make fetches for `url` fail at the transport level
    pub fn fail(&self, url: &str) {
        self.fail.lock().unwrap().insert(url.to_string());
    }

    pub fn calls(&self) -> Vec<(String, FetchMode)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u == url)
            .count()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str, mode: FetchMode) -> PrecacheResult<CachedResponse> {
        self.calls.lock().unwrap().push((url.to_string(), mode));
        if self.fail.lock().unwrap().contains(url) {
            return Err(PrecacheError::fetch(url, "simulated network failure"));
        }
        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| PrecacheError::fetch(url, "no scripted response"))
    }
}

/// Store provider whose named store rejects writes
///
/// Used to force a fault mid-reconciliation and observe the recovery path.
pub(crate) struct FailingStores {
    inner: MemoryStores,
    fail_put_store: String,
}

impl FailingStores {
    pub fn failing_put(store: &str) -> Self {
        Self {
            inner: MemoryStores::new(),
            fail_put_store: store.to_string(),
        }
    }
}

#[async_trait]
impl StoreProvider for FailingStores {
    async fn open(&self, name: &str) -> PrecacheResult<Box<dyn Store>> {
        let store = self.inner.open(name).await?;
        if name == self.fail_put_store {
            Ok(Box::new(FailingStore { inner: store }))
        } else {
            Ok(store)
        }
    }

    async fn delete(&self, name: &str) -> PrecacheResult<()> {
        self.inner.delete(name).await
    }

    async fn has(&self, name: &str) -> PrecacheResult<bool> {
        self.inner.has(name).await
    }
}

struct FailingStore {
    inner: Box<dyn Store>,
}

#[async_trait]
impl Store for FailingStore {
    async fn keys(&self) -> PrecacheResult<Vec<String>> {
        self.inner.keys().await
    }

    async fn get(&self, key: &str) -> PrecacheResult<Option<CachedResponse>> {
        self.inner.get(key).await
    }

    async fn put(&self, _key: &str, _response: &CachedResponse) -> PrecacheResult<()> {
        Err(PrecacheError::Internal("injected put failure".to_string()))
    }

    async fn delete(&self, key: &str) -> PrecacheResult<bool> {
        self.inner.delete(key).await
    }
}
