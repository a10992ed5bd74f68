//! Deployment generations and the store names they own.
//!
//! A generation is one versioned deployment. It owns exactly two stores, the
//! precache store filled at install time and the runtime store filled lazily
//! while serving. Both names embed the generation's version tag, so two
//! deployed versions never share a store name:
//!
//! ```
//! use shellcache_core::{Generation, GenerationTag, StoreName};
//!
//! let generation = Generation::new("shell", GenerationTag::new("v7-9"));
//! assert_eq!(generation.precache().as_str(), "shell-precache-v7-9");
//! assert_eq!(generation.runtime().as_str(), "shell-runtime-v7-9");
//!
//! assert!(generation.owns(&StoreName::new("shell-runtime-v7-9")));
//! assert!(!generation.owns(&StoreName::new("shell-runtime-v7-8")));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Version tag identifying a deployment generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationTag(SmolStr);

impl GenerationTag {
    /// Creates a tag.
    pub fn new(tag: impl Into<SmolStr>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the tag is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for GenerationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Name of a store managed by a store manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreName(SmolStr);

impl StoreName {
    /// Creates a store name.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self(name.into())
    }

    /// Builds the name of a generation's store: `{prefix}-{role}-{tag}`.
    pub fn for_generation(prefix: &str, role: StoreRole, tag: &GenerationTag) -> Self {
        Self(SmolStr::from(format!("{prefix}-{}-{tag}", role.as_str())))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for StoreName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Role a store plays within its generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreRole {
    /// Filled eagerly at install time from the fixed asset list.
    Precache,
    /// Filled lazily as requests are served.
    Runtime,
}

impl StoreRole {
    /// Role name as used inside store names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Precache => "precache",
            Self::Runtime => "runtime",
        }
    }
}

/// One deployment generation and the two stores it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    tag: GenerationTag,
    precache: StoreName,
    runtime: StoreName,
}

impl Generation {
    /// Creates a generation whose store names start with `prefix`.
    pub fn new(prefix: &str, tag: GenerationTag) -> Self {
        Self {
            precache: StoreName::for_generation(prefix, StoreRole::Precache, &tag),
            runtime: StoreName::for_generation(prefix, StoreRole::Runtime, &tag),
            tag,
        }
    }

    /// Version tag of this generation.
    pub fn tag(&self) -> &GenerationTag {
        &self.tag
    }

    /// Name of the precache store.
    pub fn precache(&self) -> &StoreName {
        &self.precache
    }

    /// Name of the runtime store.
    pub fn runtime(&self) -> &StoreName {
        &self.runtime
    }

    /// Name of the store playing `role`.
    pub fn store(&self, role: StoreRole) -> &StoreName {
        match role {
            StoreRole::Precache => &self.precache,
            StoreRole::Runtime => &self.runtime,
        }
    }

    /// Whether `name` is exactly one of this generation's store names.
    ///
    /// Matching is by exact name; a store sharing only a prefix or tag
    /// fragment is not owned.
    pub fn owns(&self, name: &StoreName) -> bool {
        *name == self.precache || *name == self.runtime
    }
}
