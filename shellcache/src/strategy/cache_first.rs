use std::future::Future;

use shellcache_backend::StoreHandle;
use shellcache_core::{FetchRequest, Upstream};

use super::{Served, Strategy, lookup, write_through};
use crate::ShellError;

/// Serve from the store; go to the network only on a miss.
///
/// A hit never touches the network. A miss is fetched, written through when
/// cacheable and returned. A network failure on a miss fails the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheFirst;

impl Strategy for CacheFirst {
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
            if let Some(cached) = lookup(store, &identity).await {
                return Ok(Served::cache(cached));
            }

            let response = upstream.call(request).await?;
            write_through(store, identity, &response).await;
            Ok(Served::network(response))
        }
    }
}
