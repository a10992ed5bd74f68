//! Intercepted requests and the identity they are cached under.
//!
//! - [`FetchRequest`] - a request as handed over by the host
//! - [`RequestMode`] - the declared fetch mode (navigation, cors, ...)
//! - [`RequestIdentity`] - the routing and storage key derived from a request
//!
//! ## Identity
//!
//! A [`RequestIdentity`] is the pair of method and normalized URL. The
//! fragment is never part of the identity, so `/index.html#top` and
//! `/index.html` share one cache entry:
//!
//! ```
//! use shellcache_core::RequestIdentity;
//! use url::Url;
//!
//! let a = RequestIdentity::get(Url::parse("https://app.test/index.html#top").unwrap());
//! let b = RequestIdentity::get(Url::parse("https://app.test/index.html").unwrap());
//! assert_eq!(a, b);
//! assert_eq!(a.to_string(), "GET https://app.test/index.html");
//! ```

use std::fmt;

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, header::ACCEPT};
use serde::{Deserialize, Serialize};
use url::Url;

/// Declared mode of an intercepted request.
///
/// Mirrors the values of the `Sec-Fetch-Mode` request header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RequestMode {
    /// Top-level document navigation.
    Navigate,
    /// Same-origin only request.
    SameOrigin,
    /// Cross-origin request without CORS; yields opaque responses.
    #[default]
    NoCors,
    /// Cross-origin request with CORS.
    Cors,
}

impl RequestMode {
    /// Parses a `Sec-Fetch-Mode` header value.
    ///
    /// Unknown values yield `None`; `websocket` is treated as unknown since it
    /// never reaches the fetch interception path.
    pub fn from_sec_fetch_mode(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "navigate" => Some(Self::Navigate),
            "same-origin" => Some(Self::SameOrigin),
            "no-cors" => Some(Self::NoCors),
            "cors" => Some(Self::Cors),
            _ => None,
        }
    }

    /// Returns the `Sec-Fetch-Mode` spelling of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Navigate => "navigate",
            Self::SameOrigin => "same-origin",
            Self::NoCors => "no-cors",
            Self::Cors => "cors",
        }
    }
}

/// Routing and storage key of a request: method plus normalized URL.
///
/// Built once per request and never stored on its own; stores use it as the
/// key of their entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestIdentity {
    #[serde(with = "http_serde::method")]
    method: Method,
    url: Url,
}

impl RequestIdentity {
    /// Creates an identity, dropping the URL fragment.
    pub fn new(method: Method, mut url: Url) -> Self {
        url.set_fragment(None);
        Self { method, url }
    }

    /// Shortcut for a `GET` identity.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Normalized request URL.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// An intercepted request.
///
/// Only the method, URL, mode and the `Accept` header take part in routing.
/// The body is carried along for passthrough fetches and never inspected.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    method: Method,
    url: Url,
    mode: RequestMode,
    headers: HeaderMap,
    body: Bytes,
}

impl FetchRequest {
    /// Creates a request with the given method and URL and default mode.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            mode: RequestMode::default(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Creates a `GET` request.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Creates a top-level navigation request accepting HTML.
    pub fn navigate(url: Url) -> Self {
        Self::get(url)
            .with_mode(RequestMode::Navigate)
            .with_header(ACCEPT, HeaderValue::from_static("text/html"))
    }

    /// Sets the request mode.
    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Appends a header.
    pub fn with_header(mut self, name: http::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replaces all headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Declared request mode.
    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Request body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Whether any `Accept` header lists `media`, ignoring ASCII case and
    /// parameters such as `q`.
    pub fn accepts(&self, media: &str) -> bool {
        self.headers
            .get_all(ACCEPT)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .any(|range| {
                let range = range.split_once(';').map_or(range, |(essence, _)| essence);
                range.trim().eq_ignore_ascii_case(media)
            })
    }

    /// Storage key of this request.
    pub fn identity(&self) -> RequestIdentity {
        RequestIdentity::new(self.method.clone(), self.url.clone())
    }
}
