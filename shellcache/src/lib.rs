#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! # shellcache
//!
//! Offline-capable request interception: decides, per request, whether to
//! answer from a local versioned store, the network, or both, and keeps those
//! stores consistent across deployments.
//!
//! ## Control flow
//!
//! The [`LifecycleController`](lifecycle::LifecycleController) runs once per
//! deployment: `install` fills the precache store of the new generation,
//! `activate` deletes every store the new generation does not own. After
//! that every intercepted request goes through
//! [`Router::handle`](router::Router::handle):
//!
//! ```text
//! Router -> Classifier -> Strategy -> Store (+ Upstream)
//! ```
//!
//! | Route class | Strategy | Store |
//! |-------------|----------|-------|
//! | Navigation | network-first, offline fallback document | runtime |
//! | Same-origin asset | stale-while-revalidate | precache |
//! | Allow-listed cross-origin | cache-first | runtime |
//! | Other | network, last-resort cache lookup | both |
//! | Non-GET | network only | none |

/// Request classification.
///
/// [`Classifier`](classifier::Classifier) assigns each request exactly one
/// [`RouteClass`].
pub mod classifier;

/// Shell configuration loaded from YAML.
pub mod config;

/// Error types for lifecycle and routing operations.
pub mod error;

/// Install/activate lifecycle of a deployment generation.
pub mod lifecycle;

/// Metrics declarations, active with the `metrics` feature.
pub mod metrics;

/// Background task execution for stale-while-revalidate refreshes.
pub mod offload;

/// The fetch-interception entry point.
pub mod router;

/// Fetch-resolution strategies.
pub mod strategy;

pub use classifier::Classifier;
pub use config::{ConfigError, ShellConfig};
pub use error::ShellError;
pub use lifecycle::{ActivateOutcome, Directive, InstallOutcome, LifecycleController, LifecycleState};
pub use offload::{OffloadConfig, OffloadManager};
pub use router::Router;
pub use strategy::{CacheFirst, NetworkFirst, Served, StaleWhileRevalidate, Strategy};

pub use shellcache_backend::{
    DeleteStatus, MemoryStoreManager, PopulateError, PopulateExt, Store, StoreError, StoreHandle,
    StoreManager,
};
pub use shellcache_core::{
    BoxError, FetchRequest, Generation, GenerationTag, Offload, RequestIdentity, RequestMode,
    ResponseKind, ResponseSnapshot, ResponseSource, RouteClass, StoreName, StoreRole, Upstream,
    UpstreamError, UpstreamResult, is_cacheable,
};
