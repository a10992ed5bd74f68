//! Shell configuration.
//!
//! Everything the engine needs from the surrounding application: where it is
//! served from, which version is deploying, what to precache, which
//! cross-origin hosts are trusted and which document to serve offline.
//!
//! ```
//! use shellcache::ShellConfig;
//!
//! let config = ShellConfig::from_yaml(r#"
//! origin: "https://app.test"
//! version: "v7-9"
//! precache:
//!   - "/"
//!   - "/index.html"
//!   - "https://cdnjs.cloudflare.com/ajax/libs/jspdf/2.5.1/jspdf.umd.min.js"
//! allowed_hosts:
//!   - cdnjs.cloudflare.com
//! "#).unwrap();
//!
//! assert_eq!(config.generation().precache().as_str(), "shell-precache-v7-9");
//! assert_eq!(config.precache_requests().unwrap().len(), 3);
//! ```

use serde::{Deserialize, Serialize};
use shellcache_core::{FetchRequest, Generation, GenerationTag, RequestIdentity};
use thiserror::Error;
use url::Url;

use crate::classifier::Classifier;

/// Errors raised while loading or interpreting a [`ShellConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The YAML document could not be deserialized.
    #[error("invalid shell configuration: {0}")]
    Parse(String),

    /// A configured path or URL could not be resolved against the origin.
    #[error("invalid url {value:?} in shell configuration")]
    InvalidUrl {
        /// The offending entry.
        value: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },

    /// The origin cannot serve as a base for relative paths.
    #[error("origin {0} cannot be used as a base url")]
    InvalidOrigin(Url),

    /// The version tag is empty.
    #[error("version tag must not be empty")]
    EmptyVersion,
}

fn default_cache_prefix() -> String {
    "shell".to_owned()
}

fn default_fallback_document() -> Option<String> {
    Some("/".to_owned())
}

fn default_skip_waiting() -> bool {
    true
}

/// Configuration of one deployed shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Origin the shell is served from.
    pub origin: Url,
    /// Prefix of every store name.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,
    /// Version tag of the deploying generation.
    pub version: GenerationTag,
    /// Paths (relative to `origin`) or absolute URLs to precache at install.
    #[serde(default)]
    pub precache: Vec<String>,
    /// Closed list of trusted cross-origin hosts. Exact match, no wildcards.
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
    /// Document served when a navigation fails offline with no cached entry.
    #[serde(default = "default_fallback_document")]
    pub fallback_document: Option<String>,
    /// Promote a freshly installed generation without waiting for old
    /// clients to go away.
    ///
    /// Favors fast rollout over mid-session consistency: open tabs may briefly
    /// see an old document together with new assets.
    #[serde(default = "default_skip_waiting")]
    pub skip_waiting: bool,
}

impl ShellConfig {
    /// Creates a configuration with defaults for everything but origin and
    /// version.
    pub fn new(origin: Url, version: GenerationTag) -> Self {
        Self {
            origin,
            cache_prefix: default_cache_prefix(),
            version,
            precache: Vec::new(),
            allowed_hosts: Vec::new(),
            fallback_document: default_fallback_document(),
            skip_waiting: default_skip_waiting(),
        }
    }

    /// Parses and validates a YAML configuration.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_saphyr::from_str(yaml).map_err(|error| ConfigError::Parse(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the store name prefix.
    pub fn cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cache_prefix = prefix.into();
        self
    }

    /// Sets the precache list.
    pub fn precache<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.precache = entries.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the trusted cross-origin hosts.
    pub fn allowed_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Sets or clears the offline fallback document.
    pub fn fallback_document(mut self, document: Option<impl Into<String>>) -> Self {
        self.fallback_document = document.map(Into::into);
        self
    }

    /// Sets whether installs request immediate promotion.
    pub fn skip_waiting(mut self, skip: bool) -> Self {
        self.skip_waiting = skip;
        self
    }

    /// Checks the configuration for values that would only fail later.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.is_empty() {
            return Err(ConfigError::EmptyVersion);
        }
        if self.origin.cannot_be_a_base() {
            return Err(ConfigError::InvalidOrigin(self.origin.clone()));
        }
        self.precache_requests()?;
        self.fallback_identity()?;
        Ok(())
    }

    /// The generation this configuration deploys.
    pub fn generation(&self) -> Generation {
        Generation::new(&self.cache_prefix, self.version.clone())
    }

    /// Resolves a path or absolute URL against the origin.
    pub fn resolve(&self, value: &str) -> Result<Url, ConfigError> {
        self.origin
            .join(value)
            .map_err(|source| ConfigError::InvalidUrl {
                value: value.to_owned(),
                source,
            })
    }

    /// The precache list as `GET` requests.
    pub fn precache_requests(&self) -> Result<Vec<FetchRequest>, ConfigError> {
        self.precache
            .iter()
            .map(|entry| self.resolve(entry).map(FetchRequest::get))
            .collect()
    }

    /// Identity of the offline fallback document, if one is configured.
    pub fn fallback_identity(&self) -> Result<Option<RequestIdentity>, ConfigError> {
        self.fallback_document
            .as_deref()
            .map(|document| self.resolve(document).map(RequestIdentity::get))
            .transpose()
    }

    /// Classifier for this shell's origin and allow-list.
    pub fn classifier(&self) -> Classifier {
        Classifier::new(&self.origin, &self.allowed_hosts)
    }
}
