#![doc = include_str!("../README.md")]

mod upstream;

pub use upstream::ReqwestUpstream;

/// Re-export of the middleware client type accepted by [`ReqwestUpstream`].
pub use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
