//! Error types for store operations.

use http::StatusCode;
use shellcache_core::{BoxError, ResponseKind, UpstreamError};
use thiserror::Error;
use url::Url;

/// Error type for store operations.
///
/// Routing treats every variant as a cache miss; only lifecycle operations
/// surface it to their caller.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying storage cannot be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(BoxError),

    /// Internal backend error, state or computation error.
    #[error(transparent)]
    Internal(BoxError),
}

/// A bulk populate did not complete.
///
/// Fetching happens before any write, so `Fetch` and `Rejected` leave the
/// store untouched. `Write` can leave earlier writes of the same populate in
/// place; they are not rolled back.
#[derive(Debug, Error)]
pub enum PopulateError {
    /// A fetch failed.
    #[error("failed to fetch {url} for precache")]
    Fetch {
        /// URL that could not be fetched.
        url: Url,
        /// Network failure.
        #[source]
        source: UpstreamError,
    },

    /// A fetch produced a response that may not be stored.
    #[error("refusing to precache {url}: status {status}, kind {kind:?}")]
    Rejected {
        /// URL of the rejected response.
        url: Url,
        /// Status of the rejected response.
        status: StatusCode,
        /// Kind of the rejected response.
        kind: ResponseKind,
    },

    /// Writing a fetched response failed.
    #[error("failed to store {url} for precache")]
    Write {
        /// URL whose write failed.
        url: Url,
        /// Storage failure.
        #[source]
        source: StoreError,
    },
}

impl PopulateError {
    /// URL of the request that made the populate fail.
    pub fn url(&self) -> &Url {
        match self {
            Self::Fetch { url, .. } | Self::Rejected { url, .. } | Self::Write { url, .. } => url,
        }
    }
}
