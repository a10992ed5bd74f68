//! Two-layer store view.
//!
//! Reads try the primary store first and fall back to the secondary one on a
//! miss or a read failure. Writes, removals and key listing only touch the
//! primary store; the secondary store is never modified through this view.
//!
//! The engine uses it to read a generation's runtime store backed by its
//! precache store, so entries precached at install are found by strategies
//! that write to the runtime store.

use std::sync::Arc;

use async_trait::async_trait;
use shellcache_core::{RequestIdentity, ResponseSnapshot, StoreName};
use tracing::debug;

use crate::{DeleteStatus, Store, StoreHandle, StoreResult};

/// Primary store with read-only fallback to a secondary store.
pub struct LayeredStore {
    primary: StoreHandle,
    secondary: StoreHandle,
}

impl LayeredStore {
    /// Layers `secondary` under `primary`.
    pub fn new(primary: StoreHandle, secondary: StoreHandle) -> Self {
        Self { primary, secondary }
    }

    /// Layers `secondary` under `primary` and returns a shared handle.
    pub fn handle(primary: StoreHandle, secondary: StoreHandle) -> StoreHandle {
        Arc::new(Self::new(primary, secondary))
    }
}

impl std::fmt::Debug for LayeredStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredStore")
            .field("primary", self.primary.name())
            .field("secondary", self.secondary.name())
            .finish()
    }
}

#[async_trait]
impl Store for LayeredStore {
    fn name(&self) -> &StoreName {
        self.primary.name()
    }

    async fn get(&self, identity: &RequestIdentity) -> StoreResult<Option<ResponseSnapshot>> {
        let primary_error = match self.primary.get(identity).await {
            Ok(Some(snapshot)) => return Ok(Some(snapshot)),
            Ok(None) => None,
            Err(error) => Some(error),
        };

        match self.secondary.get(identity).await {
            Ok(Some(snapshot)) => {
                debug!(store = %self.secondary.name(), %identity, "hit in secondary store");
                Ok(Some(snapshot))
            }
            Ok(None) | Err(_) => match primary_error {
                Some(error) => Err(error),
                None => Ok(None),
            },
        }
    }

    async fn put(&self, identity: RequestIdentity, snapshot: ResponseSnapshot) -> StoreResult<()> {
        self.primary.put(identity, snapshot).await
    }

    async fn remove(&self, identity: &RequestIdentity) -> StoreResult<DeleteStatus> {
        self.primary.remove(identity).await
    }

    async fn keys(&self) -> StoreResult<Vec<RequestIdentity>> {
        self.primary.keys().await
    }
}
