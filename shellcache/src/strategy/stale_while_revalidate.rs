use std::future::Future;

use shellcache_backend::StoreHandle;
use shellcache_core::{FetchRequest, Offload, Upstream};
use tracing::{debug, warn};

use super::{Served, Strategy, lookup, write_through};
use crate::ShellError;
use crate::metrics::record_revalidation;

/// Serve the stored entry now and refresh it in the background.
///
/// On a hit the cached entry is returned at once and a refresh is handed to
/// the offload executor; the refresh writes the fresh response for the next
/// request and swallows its own failures. On a miss the request waits for the
/// network, writes the response through and returns it; only then can a
/// network failure fail the request.
#[derive(Debug, Clone)]
pub struct StaleWhileRevalidate<O> {
    offload: O,
}

impl<O> StaleWhileRevalidate<O>
where
    O: Offload,
{
    /// Creates the strategy, running refreshes on `offload`.
    pub fn new(offload: O) -> Self {
        Self { offload }
    }
}

impl<O> Strategy for StaleWhileRevalidate<O>
where
    O: Offload,
{
    fn resolve<U>(
        &self,
        request: FetchRequest,
        store: &StoreHandle,
        upstream: &U,
    ) -> impl Future<Output = Result<Served, ShellError>> + Send
    where
        U: Upstream,
    {
        let mut upstream = upstream.clone();
        async move {
            let identity = request.identity();
            let Some(cached) = lookup(store, &identity).await else {
                let response = upstream.call(request).await?;
                write_through(store, identity, &response).await;
                return Ok(Served::network(response));
            };

            let store = store.clone();
            let key = identity.clone();
            let spawned = self.offload.spawn_for(key, async move {
                match upstream.call(request).await {
                    Ok(response) => {
                        debug!(store = %store.name(), %identity, "entry revalidated");
                        write_through(&store, identity, &response).await;
                        record_revalidation(true);
                    }
                    Err(error) => {
                        warn!(%identity, %error, "background revalidation failed");
                        record_revalidation(false);
                    }
                }
            });
            if !spawned {
                debug!("revalidation already in flight");
            }
            Ok(Served::cache(cached))
        }
    }
}
