use std::future::Future;

use futures::future::try_join_all;
use shellcache_core::{FetchRequest, RequestIdentity, ResponseSnapshot, Upstream, is_cacheable};
use tracing::info;

use crate::{PopulateError, Store};

/// Bulk fetch-and-store for precaching.
///
/// Implemented for every [`Store`].
pub trait PopulateExt: Store {
    /// Fetches every request and writes all responses into this store.
    ///
    /// All-or-nothing on the fetch side: every request is fetched first and
    /// the populate fails if any fetch fails or returns a response
    /// [`is_cacheable`] rejects, in which case nothing is written. Writes then
    /// happen one by one; if a write fails, entries written before it stay in
    /// the store. That mirrors the uncertain atomicity of platform caches and
    /// is not rolled back here.
    ///
    /// Returns the number of entries written.
    fn populate<U>(
        &self,
        upstream: &U,
        requests: Vec<FetchRequest>,
    ) -> impl Future<Output = Result<usize, PopulateError>> + Send
    where
        U: Upstream,
    {
        async move {
            let fetches = requests.into_iter().map(|request| {
                let mut upstream = upstream.clone();
                async move {
                    let identity = request.identity();
                    let url = request.url().clone();
                    let response = upstream
                        .call(request)
                        .await
                        .map_err(|source| PopulateError::Fetch {
                            url: url.clone(),
                            source,
                        })?;
                    if !is_cacheable(&response) {
                        return Err(PopulateError::Rejected {
                            url,
                            status: response.status(),
                            kind: response.kind(),
                        });
                    }
                    Ok::<(RequestIdentity, ResponseSnapshot), PopulateError>((identity, response))
                }
            });
            let fetched = try_join_all(fetches).await?;

            let total = fetched.len();
            for (identity, response) in fetched {
                let url = identity.url().clone();
                self.put(identity, response)
                    .await
                    .map_err(|source| PopulateError::Write { url, source })?;
            }
            info!(store = %self.name(), entries = total, "precache populated");
            Ok(total)
        }
    }
}

impl<S> PopulateExt for S where S: Store + ?Sized {}
