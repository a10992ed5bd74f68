//! Response snapshots and the cacheability rule.
//!
//! A [`ResponseSnapshot`] is a response captured at a point in time. Once
//! written to a store it is immutable; a later write under the same key
//! replaces it wholesale.
//!
//! ## Cacheability
//!
//! [`is_cacheable`] is the one place deciding whether a response may be
//! written to a store. A response qualifies when its status is in the
//! success range **or** it is opaque. Opaque responses come from cross-origin
//! requests without CORS: their contents are unreadable but the browser can
//! still use them, so opacity counts as success. Redirected and error
//! responses never qualify.
//!
//! ```
//! use http::StatusCode;
//! use shellcache_core::{ResponseSnapshot, is_cacheable};
//!
//! assert!(is_cacheable(&ResponseSnapshot::new(StatusCode::OK, "ok")));
//! assert!(is_cacheable(&ResponseSnapshot::opaque()));
//! assert!(!is_cacheable(&ResponseSnapshot::new(StatusCode::NOT_FOUND, "")));
//! assert!(!is_cacheable(&ResponseSnapshot::new(StatusCode::OK, "").with_redirected(true)));
//! ```

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode, header::HeaderName};
use serde::{Deserialize, Serialize};

/// Type of a response as seen by the requesting page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResponseKind {
    /// Same-origin response.
    #[default]
    Basic,
    /// Cross-origin response with CORS headers; readable.
    Cors,
    /// Cross-origin `no-cors` response; unreadable but usable.
    Opaque,
    /// Redirect produced by a `manual` redirect fetch.
    OpaqueRedirect,
    /// Network error placeholder.
    Error,
}

/// A response captured at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    #[serde(with = "http_serde::status_code")]
    status: StatusCode,
    #[serde(with = "http_serde::header_map")]
    headers: HeaderMap,
    body: Bytes,
    kind: ResponseKind,
    redirected: bool,
}

impl ResponseSnapshot {
    /// Creates a basic response with the given status and body.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            kind: ResponseKind::Basic,
            redirected: false,
        }
    }

    /// Creates a `200 OK` basic response.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Creates an opaque response.
    ///
    /// The status of an opaque response is unreadable to the page; the
    /// placeholder status stored here is never consulted by [`is_cacheable`].
    pub fn opaque() -> Self {
        Self::new(StatusCode::OK, Bytes::new()).with_kind(ResponseKind::Opaque)
    }

    /// Sets the response kind.
    pub fn with_kind(mut self, kind: ResponseKind) -> Self {
        self.kind = kind;
        self
    }

    /// Marks the response as the product of a followed redirect.
    pub fn with_redirected(mut self, redirected: bool) -> Self {
        self.redirected = redirected;
        self
    }

    /// Appends a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replaces all headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Response kind.
    pub fn kind(&self) -> ResponseKind {
        self.kind
    }

    /// Whether a redirect was followed to produce this response.
    pub fn redirected(&self) -> bool {
        self.redirected
    }

    /// Whether this is an opaque cross-origin response.
    pub fn is_opaque(&self) -> bool {
        self.kind == ResponseKind::Opaque
    }

    /// Whether the page would see this response as `ok`.
    ///
    /// Opaque responses are never `ok` from the page's point of view.
    pub fn is_ok(&self) -> bool {
        matches!(self.kind, ResponseKind::Basic | ResponseKind::Cors) && self.status.is_success()
    }

    /// See [`is_cacheable`].
    pub fn is_cacheable(&self) -> bool {
        is_cacheable(self)
    }

    /// Splits the snapshot into its status, headers and body.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, self.body)
    }
}

/// Decides whether a response may be written to a store.
///
/// `true` for successful basic/cors responses and for opaque responses;
/// `false` for redirected responses, error and opaque-redirect responses and
/// any non-success status.
pub fn is_cacheable(response: &ResponseSnapshot) -> bool {
    if response.redirected {
        return false;
    }
    match response.kind {
        ResponseKind::Opaque => true,
        ResponseKind::Basic | ResponseKind::Cors => response.status.is_success(),
        ResponseKind::OpaqueRedirect | ResponseKind::Error => false,
    }
}

/// Where the response returned for a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseSource {
    /// Fresh from the network.
    Network,
    /// From a store entry for the request itself.
    Cache,
    /// The offline fallback document, served in place of a failed navigation.
    Fallback,
    /// Non-GET request passed straight through, no store involved.
    Bypass,
}

impl ResponseSource {
    /// Short label for headers, logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Cache => "cache",
            Self::Fallback => "fallback",
            Self::Bypass => "bypass",
        }
    }
}
