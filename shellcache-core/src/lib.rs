#![warn(missing_docs)]
//! # shellcache-core
//!
//! Core traits and types for the shellcache offline request-interception engine.
//!
//! This crate holds the vocabulary every other shellcache crate speaks:
//!
//! - **Requests** as the host hands them over ([`FetchRequest`]) and the key
//!   they are stored under ([`RequestIdentity`])
//! - **Responses** captured into a store ([`ResponseSnapshot`]) and the single
//!   rule deciding whether a response may be stored ([`is_cacheable`])
//! - **Generations** of versioned stores ([`Generation`], [`StoreName`])
//! - **Route classes** a request can be assigned to ([`RouteClass`])
//! - **Collaborators**: the live network ([`Upstream`]) and background task
//!   execution ([`Offload`])

pub mod generation;
pub mod offload;
pub mod request;
pub mod response;
pub mod route;
pub mod upstream;

pub use generation::{Generation, GenerationTag, StoreName, StoreRole};
pub use offload::Offload;
pub use request::{FetchRequest, RequestIdentity, RequestMode};
pub use response::{ResponseKind, ResponseSnapshot, ResponseSource, is_cacheable};
pub use route::RouteClass;
#[doc(hidden)]
pub use smol_str::SmolStr;
pub use upstream::{BoxError, Upstream, UpstreamError, UpstreamResult};
