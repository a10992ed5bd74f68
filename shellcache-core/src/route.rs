//! Routing classes assigned to intercepted requests.

use std::fmt;

/// Per-request routing tag. Recomputed for every request, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// Non-GET request; excluded from all caching logic.
    Bypass,
    /// Document navigation; served network-first.
    Navigation,
    /// Same-origin sub-resource; served stale-while-revalidate.
    SameOriginAsset,
    /// Cross-origin request to an allow-listed host; served cache-first.
    AllowedCrossOrigin,
    /// Anything else; passthrough with a last-resort cache lookup.
    Other,
}

impl RouteClass {
    /// Short label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bypass => "bypass",
            Self::Navigation => "navigation",
            Self::SameOriginAsset => "same_origin_asset",
            Self::AllowedCrossOrigin => "allowed_cross_origin",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for RouteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
