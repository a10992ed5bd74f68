//! Traits and structs for shellcache store interaction.
//!
//! A [`StoreManager`] owns a set of named, versioned [`Store`]s. Each store
//! maps request identities to response snapshots. The storage engine behind
//! them belongs to the host; [`MemoryStoreManager`] is the in-process
//! implementation used by default and in tests.
//!
//! Bulk precaching lives in [`PopulateExt::populate`].
mod error;
mod layered;
mod memory;
mod populate;
mod store;

pub use error::{PopulateError, StoreError};
pub use layered::LayeredStore;
pub use memory::{MemoryStore, MemoryStoreManager};
pub use populate::PopulateExt;
pub use store::{Store, StoreHandle, StoreManager, StoreResult};

/// Status of a delete operation.
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Record deleted.
    Deleted,
    /// Record already missing.
    Missing,
}

impl DeleteStatus {
    /// Whether anything was deleted.
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }
}
