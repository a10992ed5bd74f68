use std::future::Future;

use shellcache_backend::StoreHandle;
use shellcache_core::{FetchRequest, RequestIdentity, Upstream};
use tracing::{debug, warn};

use super::{Served, Strategy, lookup, write_through};
use crate::ShellError;

/// Try the network; fall back to the store, then to an offline document.
///
/// Any response the network produces is returned, error statuses included;
/// only cacheable ones are written through. When the network fails, the
/// store entry for the request is returned if present, otherwise the
/// configured fallback document if that is present, otherwise the network
/// failure.
#[derive(Clone, Default)]
pub struct NetworkFirst {
    fallback: Option<(StoreHandle, RequestIdentity)>,
}

impl NetworkFirst {
    /// Network-first without a fallback document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `identity` from `store` when a request fails offline with no
    /// entry of its own.
    pub fn with_fallback(store: StoreHandle, identity: RequestIdentity) -> Self {
        Self {
            fallback: Some((store, identity)),
        }
    }
}

impl std::fmt::Debug for NetworkFirst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkFirst")
            .field(
                "fallback",
                &self
                    .fallback
                    .as_ref()
                    .map(|(store, identity)| (store.name().clone(), identity.clone())),
            )
            .finish()
    }
}

impl Strategy for NetworkFirst {
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
            let error = match upstream.call(request).await {
                Ok(response) => {
                    write_through(store, identity, &response).await;
                    return Ok(Served::network(response));
                }
                Err(error) => error,
            };

            warn!(%identity, %error, "network failed, falling back to cache");
            if let Some(cached) = lookup(store, &identity).await {
                return Ok(Served::cache(cached));
            }
            if let Some((fallback_store, fallback)) = &self.fallback {
                if let Some(document) = lookup(fallback_store, fallback).await {
                    debug!(%identity, %fallback, "serving offline fallback");
                    return Ok(Served::fallback(document));
                }
            }
            Err(error.into())
        }
    }
}
