use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use http::header::HeaderName;
use http::request::Parts;
use http::{HeaderValue, Request, Response};
use http_body::Body;
use http_body_util::{BodyExt, Full};
use shellcache::{
    BoxError, FetchRequest, Offload, RequestMode, ResponseSource, Router, Served, ShellError,
    StoreManager, Upstream,
};
use thiserror::Error;
use tower::Service;
use tracing::debug;
use url::Url;

/// Default name of the header reporting where a response came from.
pub const DEFAULT_CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache-status");

/// Errors returned by [`ShellService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request target could not be turned into an absolute URL.
    #[error("invalid request uri {uri}")]
    InvalidUri {
        /// The request target as received.
        uri: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
    /// Reading the request body failed.
    #[error("failed to read request body")]
    Body(#[source] BoxError),
    /// The router produced no response.
    #[error(transparent)]
    Shell(#[from] ShellError),
}

/// Tower service answering every request through a [`Router`].
///
/// Requests in origin-form (`/path?query`) are resolved against the shell's
/// origin. The request mode is read from `Sec-Fetch-Mode` and defaults to
/// `no-cors`. Every response carries a cache status header:
///
/// | Value | Source |
/// |-------|--------|
/// | `MISS` | network |
/// | `HIT` | store |
/// | `OFFLINE` | offline fallback document |
/// | `BYPASS` | network, no store involved |
pub struct ShellService<M, U, O> {
    router: Arc<Router<M, U, O>>,
    origin: Url,
    status_header: HeaderName,
}

impl<M, U, O> ShellService<M, U, O> {
    /// Creates a service answering through `router` for a shell served from
    /// `origin`.
    pub fn new(router: Router<M, U, O>, origin: Url) -> Self {
        Self {
            router: Arc::new(router),
            origin,
            status_header: DEFAULT_CACHE_STATUS_HEADER,
        }
    }

    /// Sets the name of the cache status header.
    pub fn status_header(mut self, name: HeaderName) -> Self {
        self.status_header = name;
        self
    }

    /// The router answering requests.
    pub fn router(&self) -> &Router<M, U, O> {
        &self.router
    }
}

impl<M, U, O> Clone for ShellService<M, U, O> {
    fn clone(&self) -> Self {
        Self {
            router: self.router.clone(),
            origin: self.origin.clone(),
            status_header: self.status_header.clone(),
        }
    }
}

impl<M, U, O, ReqBody> Service<Request<ReqBody>> for ShellService<M, U, O>
where
    M: StoreManager + 'static,
    U: Upstream,
    O: Offload + 'static,
    ReqBody: Body + Send + 'static,
    ReqBody::Data: Send,
    ReqBody::Error: Into<BoxError>,
{
    type Response = Response<Full<Bytes>>;
    type Error = ServiceError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let router = self.router.clone();
        let origin = self.origin.clone();
        let status_header = self.status_header.clone();

        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let url = absolute_url(&parts, &origin)?;
            let body = body
                .collect()
                .await
                .map_err(|error| ServiceError::Body(error.into()))?
                .to_bytes();
            let fetch = into_fetch_request(parts, url, body);

            let served = router.handle(fetch).await?;
            debug!(source = served.source.as_str(), "request served");
            Ok(into_response(served, status_header))
        })
    }
}

fn absolute_url(parts: &Parts, origin: &Url) -> Result<Url, ServiceError> {
    let uri = &parts.uri;
    let parsed = if uri.scheme().is_some() {
        Url::parse(&uri.to_string())
    } else {
        origin.join(uri.path_and_query().map_or("/", |target| target.as_str()))
    };
    parsed.map_err(|source| ServiceError::InvalidUri {
        uri: uri.to_string(),
        source,
    })
}

fn into_fetch_request(parts: Parts, url: Url, body: Bytes) -> FetchRequest {
    let mode = parts
        .headers
        .get("sec-fetch-mode")
        .and_then(|value| value.to_str().ok())
        .and_then(RequestMode::from_sec_fetch_mode)
        .unwrap_or_default();
    FetchRequest::new(parts.method, url)
        .with_mode(mode)
        .with_headers(parts.headers)
        .with_body(body)
}

fn cache_status(source: ResponseSource) -> HeaderValue {
    HeaderValue::from_static(match source {
        ResponseSource::Network => "MISS",
        ResponseSource::Cache => "HIT",
        ResponseSource::Fallback => "OFFLINE",
        ResponseSource::Bypass => "BYPASS",
    })
}

fn into_response(served: Served, status_header: HeaderName) -> Response<Full<Bytes>> {
    let status_value = cache_status(served.source);
    let (status, headers, body) = served.response.into_parts();
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response.headers_mut().insert(status_header, status_value);
    response
}
