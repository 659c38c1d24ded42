//! In-memory store provider
//!
//! Backs tests and ephemeral runs. Handles reference their store by name,
//! so a whole-store delete is visible to every open handle and a later put
//! through an old handle recreates the store, mirroring the lazy-create
//! semantics of [`StoreProvider::open`].

use crate::error::PrecacheResult;
use crate::store::{CachedResponse, Store, StoreProvider};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type StoreMap = HashMap<String, HashMap<String, CachedResponse>>;

/// Store provider keeping everything in process memory
#[derive(Default, Clone)]
pub struct MemoryStores {
    inner: Arc<Mutex<StoreMap>>,
}

impl MemoryStores {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreProvider for MemoryStores {
    async fn open(&self, name: &str) -> PrecacheResult<Box<dyn Store>> {
        let mut stores = self.inner.lock().unwrap();
        stores.entry(name.to_string()).or_default();
        Ok(Box::new(MemoryStore {
            name: name.to_string(),
            inner: Arc::clone(&self.inner),
        }))
    }

    async fn delete(&self, name: &str) -> PrecacheResult<()> {
        self.inner.lock().unwrap().remove(name);
        Ok(())
    }

    async fn has(&self, name: &str) -> PrecacheResult<bool> {
        Ok(self.inner.lock().unwrap().contains_key(name))
    }
}

struct MemoryStore {
    name: String,
    inner: Arc<Mutex<StoreMap>>,
}

#[async_trait]
impl Store for MemoryStore {
    async fn keys(&self) -> PrecacheResult<Vec<String>> {
        let stores = self.inner.lock().unwrap();
        let mut keys: Vec<String> = stores
            .get(&self.name)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }

    async fn get(&self, key: &str) -> PrecacheResult<Option<CachedResponse>> {
        let stores = self.inner.lock().unwrap();
        Ok(stores
            .get(&self.name)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn put(&self, key: &str, response: &CachedResponse) -> PrecacheResult<()> {
        let mut stores = self.inner.lock().unwrap();
        stores
            .entry(self.name.clone())
            .or_default()
            .insert(key.to_string(), response.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> PrecacheResult<bool> {
        let mut stores = self.inner.lock().unwrap();
        Ok(stores
            .get_mut(&self.name)
            .is_some_and(|entries| entries.remove(key).is_some()))
    }
}
