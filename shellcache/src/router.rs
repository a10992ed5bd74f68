use std::time::Instant;

use shellcache_backend::{LayeredStore, StoreHandle, StoreManager};
use shellcache_core::{
    FetchRequest, Generation, Offload, RequestIdentity, ResponseSnapshot, RouteClass, StoreName,
    Upstream,
};
use tracing::{debug, warn};

use crate::classifier::Classifier;
use crate::config::{ConfigError, ShellConfig};
use crate::error::ShellError;
use crate::metrics::record_request;
use crate::offload::OffloadManager;
use crate::strategy::{CacheFirst, NetworkFirst, Served, StaleWhileRevalidate, Strategy, lookup};

/// Entry point for every intercepted request.
///
/// Classifies the request and dispatches it:
///
/// - [`RouteClass::Bypass`] - straight to the network, no store involved
/// - [`RouteClass::Navigation`] - [`NetworkFirst`] on the runtime store read
///   through to the precache store, with the fallback document read from the
///   precache store
/// - [`RouteClass::SameOriginAsset`] - [`StaleWhileRevalidate`] on the
///   precache store
/// - [`RouteClass::AllowedCrossOrigin`] - [`CacheFirst`] on the runtime store
///   read through to the precache store
/// - [`RouteClass::Other`] - straight to the network, with a lookup in this
///   generation's stores only if the network fails
///
/// Stores are never created while serving. A store that is missing or cannot
/// be opened is treated as permanently empty: the request goes to the network
/// as if it had missed, and nothing is written.
#[derive(Clone, Debug)]
pub struct Router<M, U, O = OffloadManager> {
    manager: M,
    upstream: U,
    offload: O,
    classifier: Classifier,
    generation: Generation,
    fallback: Option<RequestIdentity>,
}

impl<M, U, O> Router<M, U, O>
where
    M: StoreManager,
    U: Upstream,
    O: Offload,
{
    /// Creates a router serving `generation`.
    pub fn new(
        manager: M,
        upstream: U,
        offload: O,
        classifier: Classifier,
        generation: Generation,
        fallback: Option<RequestIdentity>,
    ) -> Self {
        Self {
            manager,
            upstream,
            offload,
            classifier,
            generation,
            fallback,
        }
    }

    /// Creates a router for the generation described by `config`.
    pub fn from_config(
        manager: M,
        upstream: U,
        offload: O,
        config: &ShellConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(
            manager,
            upstream,
            offload,
            config.classifier(),
            config.generation(),
            config.fallback_identity()?,
        ))
    }

    /// The generation whose stores serve requests.
    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    /// The classifier in use.
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// The executor running background refreshes.
    pub fn offload(&self) -> &O {
        &self.offload
    }

    /// Resolves one intercepted request.
    ///
    /// Fails only when neither the network nor any store produced a response.
    pub async fn handle(&self, request: FetchRequest) -> Result<Served, ShellError> {
        let start = Instant::now();
        let route = self.classifier.classify(&request);
        debug!(identity = %request.identity(), %route, "routing request");

        let result = match route {
            RouteClass::Bypass => self.fetch(request).await.map(Served::bypass),
            RouteClass::Navigation => self.navigate(request).await,
            RouteClass::SameOriginAsset => {
                let precache = self.open(self.generation.precache()).await;
                let strategy = StaleWhileRevalidate::new(self.offload.clone());
                self.resolve(precache, request, &strategy).await
            }
            RouteClass::AllowedCrossOrigin => {
                let precache = self.open(self.generation.precache()).await;
                let store = self.runtime_over(precache).await;
                self.resolve(store, request, &CacheFirst).await
            }
            RouteClass::Other => self.passthrough(request).await,
        };

        record_request(
            route,
            result.as_ref().ok().map(|served| served.source),
            start.elapsed(),
        );
        result
    }

    async fn fetch(&self, request: FetchRequest) -> Result<ResponseSnapshot, ShellError> {
        Ok(self.upstream.clone().call(request).await?)
    }

    async fn open(&self, name: &StoreName) -> Option<StoreHandle> {
        match self.manager.open_existing(name).await {
            Ok(Some(store)) => Some(store),
            Ok(None) => {
                debug!(store = %name, "store missing, serving from network");
                None
            }
            Err(error) => {
                warn!(store = %name, %error, "store unavailable, serving from network");
                None
            }
        }
    }

    /// The runtime store, reading through to `precache` when it is open.
    async fn runtime_over(&self, precache: Option<StoreHandle>) -> Option<StoreHandle> {
        let runtime = self.open(self.generation.runtime()).await?;
        Some(match precache {
            Some(precache) => LayeredStore::handle(runtime, precache),
            None => runtime,
        })
    }

    async fn resolve<S>(
        &self,
        store: Option<StoreHandle>,
        request: FetchRequest,
        strategy: &S,
    ) -> Result<Served, ShellError>
    where
        S: Strategy,
    {
        match store {
            Some(store) => strategy.resolve(request, &store, &self.upstream).await,
            None => self.fetch(request).await.map(Served::network),
        }
    }

    async fn navigate(&self, request: FetchRequest) -> Result<Served, ShellError> {
        let precache = self.open(self.generation.precache()).await;
        let strategy = match (&self.fallback, &precache) {
            (Some(fallback), Some(precache)) => {
                NetworkFirst::with_fallback(precache.clone(), fallback.clone())
            }
            _ => NetworkFirst::new(),
        };
        let store = self.runtime_over(precache).await;
        self.resolve(store, request, &strategy).await
    }

    async fn passthrough(&self, request: FetchRequest) -> Result<Served, ShellError> {
        let identity = request.identity();
        let error = match self.fetch(request).await {
            Ok(response) => return Ok(Served::network(response)),
            Err(error) => error,
        };

        for name in [self.generation.runtime(), self.generation.precache()] {
            let Some(store) = self.open(name).await else {
                continue;
            };
            if let Some(cached) = lookup(&store, &identity).await {
                debug!(%identity, store = %name, "network failed, served last-resort cache entry");
                return Ok(Served::cache(cached));
            }
        }
        Err(error)
    }
}
