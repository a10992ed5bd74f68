//! Fetch-resolution strategies.
//!
//! Each strategy resolves one request against one store, optionally calling
//! the upstream:
//!
//! - [`CacheFirst`] - store, then network on a miss
//! - [`NetworkFirst`] - network, then store, then an offline fallback document
//! - [`StaleWhileRevalidate`] - store now, network in the background
//!
//! All three write a network response only when [`is_cacheable`] accepts it.
//! Store failures while resolving count as misses and lost writes; they are
//! logged and never fail the request.

mod cache_first;
mod network_first;
mod stale_while_revalidate;

use std::future::Future;

use shellcache_backend::StoreHandle;
use shellcache_core::{
    FetchRequest, RequestIdentity, ResponseSnapshot, ResponseSource, Upstream, is_cacheable,
};
use tracing::{debug, warn};

pub use cache_first::CacheFirst;
pub use network_first::NetworkFirst;
pub use stale_while_revalidate::StaleWhileRevalidate;

use crate::ShellError;

/// A resolved response together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    /// The response handed back to the client.
    pub response: ResponseSnapshot,
    /// Where the response came from.
    pub source: ResponseSource,
}

impl Served {
    /// A response fresh from the network.
    pub fn network(response: ResponseSnapshot) -> Self {
        Self {
            response,
            source: ResponseSource::Network,
        }
    }

    /// A response read from a store.
    pub fn cache(response: ResponseSnapshot) -> Self {
        Self {
            response,
            source: ResponseSource::Cache,
        }
    }

    /// The offline fallback document.
    pub fn fallback(response: ResponseSnapshot) -> Self {
        Self {
            response,
            source: ResponseSource::Fallback,
        }
    }

    /// A response fetched without any store involvement.
    pub fn bypass(response: ResponseSnapshot) -> Self {
        Self {
            response,
            source: ResponseSource::Bypass,
        }
    }

    /// Unwraps the response.
    pub fn into_response(self) -> ResponseSnapshot {
        self.response
    }
}

/// A fetch-resolution algorithm operating on one store.
pub trait Strategy: Send + Sync {
    /// Resolves `request` against `store`, fetching from `upstream` as the
    /// algorithm requires.
    ///
    /// Fails only when no response at all could be produced.
    fn resolve<U>(
        &self,
        request: FetchRequest,
        store: &StoreHandle,
        upstream: &U,
    ) -> impl Future<Output = Result<Served, ShellError>> + Send
    where
        U: Upstream;
}

/// Reads `identity` from `store`, treating a store failure as a miss.
pub(crate) async fn lookup(
    store: &StoreHandle,
    identity: &RequestIdentity,
) -> Option<ResponseSnapshot> {
    match store.get(identity).await {
        Ok(Some(response)) => {
            debug!(store = %store.name(), %identity, "cache hit");
            Some(response)
        }
        Ok(None) => {
            debug!(store = %store.name(), %identity, "cache miss");
            None
        }
        Err(error) => {
            warn!(store = %store.name(), %identity, %error, "store read failed, treating as miss");
            None
        }
    }
}

/// Writes `response` to `store` when it is cacheable. Failures are logged.
pub(crate) async fn write_through(
    store: &StoreHandle,
    identity: RequestIdentity,
    response: &ResponseSnapshot,
) {
    if !is_cacheable(response) {
        debug!(
            store = %store.name(),
            %identity,
            status = %response.status(),
            "response not cacheable"
        );
        return;
    }
    if let Err(error) = store.put(identity.clone(), response.clone()).await {
        warn!(store = %store.name(), %identity, %error, "store write failed");
    }
}
