//! Background execution of stale-while-revalidate refreshes.
//!
//! A refresh outlives the request that triggered it. The host runtime would
//! otherwise be free to stop the work as soon as the response is delivered,
//! so refreshes are tracked here until they finish and
//! [`OffloadManager::wait_all`] lets the host extend its lifetime until then.
//!
//! # Example
//!
//! ```ignore
//! use shellcache::offload::{OffloadConfig, OffloadManager};
//!
//! let manager = OffloadManager::new(OffloadConfig::default());
//! manager.spawn("revalidate", async {
//!     // fetch and write back
//! });
//! manager.wait_all().await;
//! ```

mod manager;
mod policy;

pub use manager::{OffloadKey, OffloadManager};
pub use policy::{OffloadConfig, OffloadConfigBuilder};
