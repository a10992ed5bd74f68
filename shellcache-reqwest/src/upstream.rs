//! Upstream backed by a reqwest-middleware client.

use std::future::Future;
use std::pin::Pin;

use reqwest_middleware::ClientWithMiddleware;
use shellcache_core::{
    FetchRequest, ResponseKind, ResponseSnapshot, Upstream, UpstreamError, UpstreamResult,
};
use tracing::debug;
use url::{Origin, Url};

/// Fetches requests over HTTP with a [`reqwest`] client.
///
/// Any middleware stacked on the client (retries, tracing, auth) runs for
/// every fetch, including background refreshes.
///
/// Responses from the shell's own origin are [`ResponseKind::Basic`], all
/// others [`ResponseKind::Cors`]: a native client can read every response, so
/// nothing comes back opaque. A response reached through a redirect is
/// flagged as redirected and will not be cached.
#[derive(Clone, Debug)]
pub struct ReqwestUpstream {
    client: ClientWithMiddleware,
    origin: Origin,
}

impl ReqwestUpstream {
    /// Creates an upstream for a shell served from `origin`.
    pub fn new(client: impl Into<ClientWithMiddleware>, origin: &Url) -> Self {
        Self {
            client: client.into(),
            origin: origin.origin(),
        }
    }
}

impl Upstream for ReqwestUpstream {
    type Future = Pin<Box<dyn Future<Output = UpstreamResult> + Send + 'static>>;

    fn call(&mut self, request: FetchRequest) -> Self::Future {
        let client = self.client.clone();
        let origin = self.origin.clone();

        Box::pin(async move {
            let url = request.url().clone();
            let response = client
                .request(request.method().clone(), url.clone())
                .headers(request.headers().clone())
                .body(request.body().clone())
                .send()
                .await
                .map_err(|error| classify_error(url.clone(), error))?;

            let status = response.status();
            let final_url = response.url().clone();
            let headers = response.headers().clone();
            let body = response
                .bytes()
                .await
                .map_err(|error| UpstreamError::transport(url.clone(), error))?;

            let kind = if final_url.origin() == origin {
                ResponseKind::Basic
            } else {
                ResponseKind::Cors
            };
            let redirected = without_fragment(&final_url) != without_fragment(&url);
            debug!(%url, %status, redirected, "fetched from network");

            Ok(ResponseSnapshot::new(status, body)
                .with_headers(headers)
                .with_kind(kind)
                .with_redirected(redirected))
        })
    }
}

fn classify_error(url: Url, error: reqwest_middleware::Error) -> UpstreamError {
    match &error {
        reqwest_middleware::Error::Reqwest(inner) if inner.is_connect() => {
            UpstreamError::Offline(url)
        }
        _ => UpstreamError::transport(url, error),
    }
}

fn without_fragment(url: &Url) -> &str {
    let full = url.as_str();
    match url.fragment() {
        Some(fragment) => &full[..full.len() - fragment.len() - 1],
        None => full,
    }
}
