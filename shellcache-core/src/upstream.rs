//! The live network collaborator.

use std::future::Future;

use thiserror::Error;
use url::Url;

use crate::{FetchRequest, ResponseSnapshot};

/// Boxed error type carried by transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a live network fetch.
pub type UpstreamResult = Result<ResponseSnapshot, UpstreamError>;

/// A live network fetch failed before producing any response.
///
/// HTTP error statuses are not failures: a `404` is a response and comes back
/// as `Ok`.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The network is unreachable.
    #[error("network unreachable for {0}")]
    Offline(Url),
    /// The transport failed while talking to the server.
    #[error("fetch of {url} failed: {source}")]
    Transport {
        /// URL being fetched.
        url: Url,
        /// Underlying transport error.
        #[source]
        source: BoxError,
    },
}

impl UpstreamError {
    /// Wraps a transport error for `url`.
    pub fn transport(url: Url, source: impl Into<BoxError>) -> Self {
        Self::Transport {
            url,
            source: source.into(),
        }
    }
}

/// The live network as seen by the engine.
///
/// Strategies clone the upstream whenever they need to fetch, including from
/// detached background tasks, hence the `Clone + 'static` bounds.
///
/// # Examples
///
/// ```rust,ignore
/// use shellcache_core::{FetchRequest, ResponseSnapshot, Upstream, UpstreamResult};
/// use std::future::Ready;
///
/// #[derive(Clone)]
/// struct Always200;
///
/// impl Upstream for Always200 {
///     type Future = Ready<UpstreamResult>;
///
///     fn call(&mut self, _request: FetchRequest) -> Self::Future {
///         std::future::ready(Ok(ResponseSnapshot::ok("hello")))
///     }
/// }
/// ```
pub trait Upstream: Clone + Send + Sync + 'static {
    /// The future that resolves to the fetched response.
    type Future: Future<Output = UpstreamResult> + Send + 'static;

    /// Fetch `request` from the network.
    fn call(&mut self, request: FetchRequest) -> Self::Future;
}
