//! Upstream adapter for calling a Tower service as the network.
//!
//! [`TowerUpstream`] lets the router treat any Tower HTTP service as its live
//! network: an HTTP client stack, or the application's own handlers when the
//! shell runs in front of them.

use bytes::Bytes;
use http::{Request, Response};
use http_body::Body;
use http_body_util::Full;
use shellcache::{BoxError, FetchRequest, Upstream, UpstreamError};
use tower::Service;
use tower::util::{Oneshot, ServiceExt};

use crate::future::TowerUpstreamFuture;

/// Adapter implementing [`Upstream`] for a Tower service.
///
/// Every call clones the service and drives it through readiness before
/// sending the request. Response bodies are buffered in full; all responses
/// are reported as same-origin ([`ResponseKind::Basic`](shellcache::ResponseKind)).
#[derive(Clone, Debug)]
pub struct TowerUpstream<S> {
    service: S,
}

impl<S> TowerUpstream<S> {
    /// Creates a new upstream adapter wrapping the given service.
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

impl<S, ResBody> Upstream for TowerUpstream<S>
where
    S: Service<Request<Full<Bytes>>, Response = Response<ResBody>>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
    S::Error: Into<BoxError>,
    ResBody: Body + Send + 'static,
    ResBody::Data: Send,
    ResBody::Error: Into<BoxError>,
{
    type Future = TowerUpstreamFuture<Oneshot<S, Request<Full<Bytes>>>, ResBody>;

    fn call(&mut self, request: FetchRequest) -> Self::Future {
        let url = request.url().clone();
        match into_http_request(&request) {
            Ok(http_request) => {
                TowerUpstreamFuture::new(url, self.service.clone().oneshot(http_request))
            }
            Err(error) => {
                let error = UpstreamError::transport(url.clone(), error);
                TowerUpstreamFuture::failed(url, error)
            }
        }
    }
}

fn into_http_request(request: &FetchRequest) -> Result<Request<Full<Bytes>>, http::Error> {
    let mut http_request = Request::builder()
        .method(request.method().clone())
        .uri(request.url().as_str())
        .body(Full::new(request.body().clone()))?;
    *http_request.headers_mut() = request.headers().clone();
    Ok(http_request)
}
