//! Tower integration for shellcache.
//!
//! [`ShellLayer`] puts the shellcache [`Router`](shellcache::Router) in front
//! of any Tower HTTP service. The wrapped service plays the live network:
//! navigations go to it first, same-origin assets are answered from the
//! precache store and refreshed through it in the background, and allow-listed
//! cross-origin assets are fetched through it once and then served from the
//! runtime store.
//!
//! # Quick Start
//!
//! ```ignore
//! use shellcache::{LifecycleController, MemoryStoreManager, ShellConfig};
//! use shellcache_tower::{ShellLayer, TowerUpstream};
//! use tower::ServiceBuilder;
//!
//! let config = ShellConfig::from_yaml(yaml)?;
//! let manager = MemoryStoreManager::new();
//!
//! // Install and activate the generation before serving.
//! let lifecycle =
//!     LifecycleController::from_config(manager.clone(), TowerUpstream::new(app.clone()), &config)?;
//! lifecycle.install().await?;
//! lifecycle.activate().await?;
//!
//! let service = ServiceBuilder::new()
//!     .layer(ShellLayer::new(manager, &config)?)
//!     .service(app);
//! ```
//!
//! # Response Headers
//!
//! | Header Value | Meaning |
//! |--------------|---------|
//! | `MISS` | Response fetched from the wrapped service |
//! | `HIT` | Response served from a store |
//! | `OFFLINE` | Wrapped service failed; offline fallback document served |
//! | `BYPASS` | Non-GET request passed straight through |
//!
//! The default header name is `x-cache-status`. Change it with
//! [`ShellLayer::status_header`].

#![warn(missing_docs)]

/// Future types for the upstream adapter.
pub mod future;
/// Tower layer building a shell service around an inner service.
pub mod layer;
/// The Tower service answering requests through the router.
pub mod service;
/// Upstream adapter for calling Tower services.
pub mod upstream;

pub use layer::ShellLayer;
pub use service::{DEFAULT_CACHE_STATUS_HEADER, ServiceError, ShellService};
pub use upstream::TowerUpstream;
