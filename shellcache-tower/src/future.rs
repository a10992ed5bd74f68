use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::ready;
use http::Response;
use http::response::Parts;
use http_body::Body;
use http_body_util::BodyExt;
use http_body_util::combinators::Collect;
use pin_project::pin_project;
use shellcache::{BoxError, ResponseSnapshot, UpstreamError, UpstreamResult};
use url::Url;

#[pin_project(project = StateProj)]
enum State<F, B>
where
    B: Body,
{
    Calling {
        #[pin]
        future: F,
    },
    Collecting {
        #[pin]
        collect: Collect<B>,
        parts: Option<Parts>,
    },
    Failed {
        error: Option<UpstreamError>,
    },
}

/// Future returned by [`TowerUpstream::call`](crate::TowerUpstream).
///
/// Calls the wrapped service, then buffers the whole response body into a
/// [`ResponseSnapshot`].
#[pin_project]
pub struct TowerUpstreamFuture<F, B>
where
    B: Body,
{
    url: Url,
    #[pin]
    state: State<F, B>,
}

impl<F, B> TowerUpstreamFuture<F, B>
where
    B: Body,
{
    pub(crate) fn new(url: Url, future: F) -> Self {
        Self {
            url,
            state: State::Calling { future },
        }
    }

    pub(crate) fn failed(url: Url, error: UpstreamError) -> Self {
        Self {
            url,
            state: State::Failed { error: Some(error) },
        }
    }
}

impl<F, B, E> Future for TowerUpstreamFuture<F, B>
where
    F: Future<Output = Result<Response<B>, E>>,
    E: Into<BoxError>,
    B: Body,
    B::Error: Into<BoxError>,
{
    type Output = UpstreamResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();
        loop {
            match this.state.as_mut().project() {
                StateProj::Calling { future } => {
                    let response = match ready!(future.poll(cx)) {
                        Ok(response) => response,
                        Err(error) => {
                            return Poll::Ready(Err(UpstreamError::transport(
                                this.url.clone(),
                                error,
                            )));
                        }
                    };
                    let (parts, body) = response.into_parts();
                    this.state.set(State::Collecting {
                        collect: body.collect(),
                        parts: Some(parts),
                    });
                }
                StateProj::Collecting { collect, parts } => {
                    let collected = match ready!(collect.poll(cx)) {
                        Ok(collected) => collected,
                        Err(error) => {
                            return Poll::Ready(Err(UpstreamError::transport(
                                this.url.clone(),
                                error,
                            )));
                        }
                    };
                    let Some(parts) = parts.take() else {
                        return Poll::Ready(Err(completed(this.url)));
                    };
                    let snapshot = ResponseSnapshot::new(parts.status, collected.to_bytes())
                        .with_headers(parts.headers);
                    return Poll::Ready(Ok(snapshot));
                }
                StateProj::Failed { error } => {
                    return Poll::Ready(Err(error.take().unwrap_or_else(|| completed(this.url))));
                }
            }
        }
    }
}

fn completed(url: &Url) -> UpstreamError {
    UpstreamError::transport(url.clone(), "upstream future polled after completion")
}
