//! In-memory store manager.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use shellcache_core::{RequestIdentity, ResponseSnapshot, StoreName};

use crate::{DeleteStatus, Store, StoreHandle, StoreManager, StoreResult};

/// A store held entirely in process memory.
///
/// Cloning a handle is cheap; all handles see the same entries.
#[derive(Debug)]
pub struct MemoryStore {
    name: StoreName,
    entries: DashMap<RequestIdentity, ResponseSnapshot>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new(name: StoreName) -> Self {
        Self {
            name,
            entries: DashMap::new(),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &StoreName {
        &self.name
    }

    async fn get(&self, identity: &RequestIdentity) -> StoreResult<Option<ResponseSnapshot>> {
        Ok(self.entries.get(identity).map(|entry| entry.value().clone()))
    }

    async fn put(&self, identity: RequestIdentity, snapshot: ResponseSnapshot) -> StoreResult<()> {
        self.entries.insert(identity, snapshot);
        Ok(())
    }

    async fn remove(&self, identity: &RequestIdentity) -> StoreResult<DeleteStatus> {
        match self.entries.remove(identity) {
            Some(_) => Ok(DeleteStatus::Deleted),
            None => Ok(DeleteStatus::Missing),
        }
    }

    async fn keys(&self) -> StoreResult<Vec<RequestIdentity>> {
        Ok(self.entries.iter().map(|entry| entry.key().clone()).collect())
    }
}

/// Store manager keeping every store in process memory.
///
/// # Caveats
///
/// - Data is **not persisted**: stores vanish with the process. Hosts that
///   need stores to survive restarts provide their own [`StoreManager`].
/// - There is **no eviction**: stores grow until deleted.
/// - A handle obtained before [`StoreManager::delete`] keeps working on the
///   detached store; re-opening the name yields a fresh, empty store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStoreManager {
    stores: Arc<DashMap<StoreName, Arc<MemoryStore>>>,
}

impl MemoryStoreManager {
    /// Creates a manager with no stores.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreManager for MemoryStoreManager {
    async fn open(&self, name: &StoreName) -> StoreResult<StoreHandle> {
        let store: StoreHandle = self
            .stores
            .entry(name.clone())
            .or_insert_with(|| Arc::new(MemoryStore::new(name.clone())))
            .value()
            .clone();
        Ok(store)
    }

    async fn keys(&self) -> StoreResult<Vec<StoreName>> {
        let mut names: Vec<StoreName> = self.stores.iter().map(|s| s.key().clone()).collect();
        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &StoreName) -> StoreResult<DeleteStatus> {
        match self.stores.remove(name) {
            Some(_) => Ok(DeleteStatus::Deleted),
            None => Ok(DeleteStatus::Missing),
        }
    }

    async fn open_existing(&self, name: &StoreName) -> StoreResult<Option<StoreHandle>> {
        Ok(self
            .stores
            .get(name)
            .map(|store| Arc::clone(store.value()) as StoreHandle))
    }

    async fn has(&self, name: &StoreName) -> StoreResult<bool> {
        Ok(self.stores.contains_key(name))
    }
}
