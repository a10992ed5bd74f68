use http::header::HeaderName;
use shellcache::{
    Classifier, ConfigError, Generation, Offload, OffloadManager, RequestIdentity, Router,
    ShellConfig, StoreManager, Upstream,
};
use tower::Layer;
use url::Url;

use crate::service::{DEFAULT_CACHE_STATUS_HEADER, ShellService};
use crate::upstream::TowerUpstream;

/// Tower layer putting the shell router in front of a service.
///
/// The wrapped service becomes the router's live network: cache misses,
/// revalidations and bypassed requests are sent to it.
#[derive(Clone, Debug)]
pub struct ShellLayer<M, O = OffloadManager> {
    manager: M,
    offload: O,
    origin: Url,
    classifier: Classifier,
    generation: Generation,
    fallback: Option<RequestIdentity>,
    status_header: HeaderName,
}

impl<M> ShellLayer<M> {
    /// Creates a layer serving the generation described by `config` from
    /// the stores of `manager`.
    pub fn new(manager: M, config: &ShellConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            manager,
            offload: OffloadManager::default(),
            origin: config.origin.clone(),
            classifier: config.classifier(),
            generation: config.generation(),
            fallback: config.fallback_identity()?,
            status_header: DEFAULT_CACHE_STATUS_HEADER,
        })
    }
}

impl<M, O> ShellLayer<M, O> {
    /// Runs background refreshes on `offload`.
    pub fn offload<NO>(self, offload: NO) -> ShellLayer<M, NO> {
        ShellLayer {
            manager: self.manager,
            offload,
            origin: self.origin,
            classifier: self.classifier,
            generation: self.generation,
            fallback: self.fallback,
            status_header: self.status_header,
        }
    }

    /// Sets the name of the cache status header.
    pub fn status_header(self, name: HeaderName) -> Self {
        Self {
            status_header: name,
            ..self
        }
    }
}

impl<S, M, O> Layer<S> for ShellLayer<M, O>
where
    M: StoreManager + Clone,
    O: Offload,
    TowerUpstream<S>: Upstream,
{
    type Service = ShellService<M, TowerUpstream<S>, O>;

    fn layer(&self, inner: S) -> Self::Service {
        let router = Router::new(
            self.manager.clone(),
            TowerUpstream::new(inner),
            self.offload.clone(),
            self.classifier.clone(),
            self.generation.clone(),
            self.fallback.clone(),
        );
        ShellService::new(router, self.origin.clone()).status_header(self.status_header.clone())
    }
}
