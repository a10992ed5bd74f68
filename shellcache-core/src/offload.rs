//! Offload trait for background task execution.
//!
//! Stale-while-revalidate answers from the store and refreshes the entry in
//! the background. The refresh is handed to an [`Offload`] implementation,
//! detached from the request that triggered it.

use std::future::Future;

use smol_str::SmolStr;

use crate::RequestIdentity;

/// Trait for spawning background tasks.
///
/// # Clone bound
///
/// Implementors should use `Arc` internally so that all clones share the same
/// configuration and the same set of in-flight tasks.
///
/// # Example
///
/// ```ignore
/// use shellcache_core::Offload;
///
/// fn refresh_later<O: Offload>(offload: &O) {
///     offload.spawn("revalidate", async move {
///         // fetch and write back
///     });
/// }
/// ```
pub trait Offload: Send + Sync + Clone {
    /// Spawn a future to be executed in the background.
    ///
    /// * `kind` - label categorizing the task (e.g. "revalidate"), used for
    ///   tracing and metrics.
    /// * `future` - the work; must not report errors, it has nowhere to send
    ///   them.
    fn spawn<F>(&self, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static;

    /// Spawn a future tied to a request identity.
    ///
    /// Implementations may skip the task when one for the same identity is
    /// already in flight. Returns `true` if the task was spawned.
    fn spawn_for<F>(&self, identity: RequestIdentity, future: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let _ = identity;
        self.spawn("revalidate", future);
        true
    }
}
