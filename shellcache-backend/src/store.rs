use std::sync::Arc;

use async_trait::async_trait;
use shellcache_core::{RequestIdentity, ResponseSnapshot, StoreName};

use crate::{DeleteStatus, StoreError};

pub type StoreResult<T> = Result<T, StoreError>;

/// Shared handle to an open store.
pub type StoreHandle = Arc<dyn Store>;

/// A named mapping from request identity to response snapshot.
///
/// Operations are individually atomic per key. There are no multi-key
/// transactions; concurrent writes to one key resolve last-write-wins.
#[async_trait]
pub trait Store: Send + Sync {
    /// Name this store was opened under.
    fn name(&self) -> &StoreName;

    async fn get(&self, identity: &RequestIdentity) -> StoreResult<Option<ResponseSnapshot>>;

    /// Writes `snapshot`, replacing any previous entry for `identity` wholesale.
    async fn put(&self, identity: RequestIdentity, snapshot: ResponseSnapshot) -> StoreResult<()>;

    async fn remove(&self, identity: &RequestIdentity) -> StoreResult<DeleteStatus>;

    /// Identities of all entries currently held.
    async fn keys(&self) -> StoreResult<Vec<RequestIdentity>>;
}

/// Creates, lists and deletes named stores.
#[async_trait]
pub trait StoreManager: Send + Sync {
    /// Opens the store called `name`, creating it if absent. Idempotent.
    async fn open(&self, name: &StoreName) -> StoreResult<StoreHandle>;

    /// Opens the store called `name` only if it exists.
    async fn open_existing(&self, name: &StoreName) -> StoreResult<Option<StoreHandle>> {
        if self.has(name).await? {
            self.open(name).await.map(Some)
        } else {
            Ok(None)
        }
    }

    /// Names of all stores created and not deleted since.
    async fn keys(&self) -> StoreResult<Vec<StoreName>>;

    /// Deletes the store called `name` with all its entries.
    async fn delete(&self, name: &StoreName) -> StoreResult<DeleteStatus>;

    async fn has(&self, name: &StoreName) -> StoreResult<bool> {
        Ok(self.keys().await?.contains(name))
    }

    /// Looks `identity` up in every existing store, in name order.
    ///
    /// Stores that fail to open or read are skipped.
    async fn match_any(&self, identity: &RequestIdentity) -> StoreResult<Option<ResponseSnapshot>> {
        for name in self.keys().await? {
            let Ok(store) = self.open(&name).await else {
                continue;
            };
            if let Ok(Some(snapshot)) = store.get(identity).await {
                return Ok(Some(snapshot));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl<M> StoreManager for Arc<M>
where
    M: StoreManager + ?Sized,
{
    async fn open(&self, name: &StoreName) -> StoreResult<StoreHandle> {
        (**self).open(name).await
    }

    async fn open_existing(&self, name: &StoreName) -> StoreResult<Option<StoreHandle>> {
        (**self).open_existing(name).await
    }

    async fn keys(&self) -> StoreResult<Vec<StoreName>> {
        (**self).keys().await
    }

    async fn delete(&self, name: &StoreName) -> StoreResult<DeleteStatus> {
        (**self).delete(name).await
    }

    async fn has(&self, name: &StoreName) -> StoreResult<bool> {
        (**self).has(name).await
    }

    async fn match_any(&self, identity: &RequestIdentity) -> StoreResult<Option<ResponseSnapshot>> {
        (**self).match_any(identity).await
    }
}
