use http::Method;
use shellcache_core::{FetchRequest, RequestMode, RouteClass};
use url::{Origin, Url};

/// Assigns every intercepted request exactly one [`RouteClass`].
///
/// Rules, first match wins:
///
/// 1. any method other than `GET` is [`RouteClass::Bypass`];
/// 2. a navigation, or a request with any `Accept` header listing `text/html`,
///    is [`RouteClass::Navigation`], whatever its path looks like;
/// 3. a request to the shell's own origin is [`RouteClass::SameOriginAsset`];
/// 4. a request to a host on the allow-list is
///    [`RouteClass::AllowedCrossOrigin`];
/// 5. anything else is [`RouteClass::Other`].
///
/// Host matching is exact and case-insensitive. `cdn.example.com` does not
/// admit `evil.cdn.example.com`.
#[derive(Debug, Clone)]
pub struct Classifier {
    origin: Origin,
    allowed_hosts: Vec<String>,
}

impl Classifier {
    /// Creates a classifier for `origin` trusting `allowed_hosts`.
    pub fn new<S: AsRef<str>>(origin: &Url, allowed_hosts: &[S]) -> Self {
        Self {
            origin: origin.origin(),
            allowed_hosts: allowed_hosts
                .iter()
                .map(|host| host.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Classifies `request`.
    pub fn classify(&self, request: &FetchRequest) -> RouteClass {
        if request.method() != Method::GET {
            return RouteClass::Bypass;
        }
        if request.mode() == RequestMode::Navigate || request.accepts("text/html") {
            return RouteClass::Navigation;
        }
        if request.url().origin() == self.origin {
            return RouteClass::SameOriginAsset;
        }
        if self.is_allowed_host(request.url()) {
            return RouteClass::AllowedCrossOrigin;
        }
        RouteClass::Other
    }

    fn is_allowed_host(&self, url: &Url) -> bool {
        url.host_str().is_some_and(|host| {
            self.allowed_hosts
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(host))
        })
    }
}
