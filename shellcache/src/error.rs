use shellcache_backend::{PopulateError, StoreError};
use shellcache_core::UpstreamError;
use thiserror::Error;

use crate::lifecycle::LifecycleState;

/// Failures surfaced by lifecycle operations and request handling.
///
/// A failure is only surfaced when no usable response was chosen yet. Store
/// failures while serving are downgraded to cache misses and never reach
/// this type from [`Router`](crate::Router); a failed background refresh is
/// logged and dropped.
#[derive(Debug, Error)]
pub enum ShellError {
    /// Precaching failed during install; the generation never becomes active.
    #[error("install failed")]
    Populate(#[from] PopulateError),

    /// A live fetch failed and nothing could be served in its place.
    #[error(transparent)]
    Network(#[from] UpstreamError),

    /// Storage failed during a lifecycle operation.
    #[error("store operation failed")]
    Store(#[from] StoreError),

    /// A lifecycle step was requested from a state that does not allow it.
    #[error("cannot {operation} while {state:?}")]
    InvalidState {
        /// The requested step.
        operation: &'static str,
        /// State the controller was in.
        state: LifecycleState,
    },
}
