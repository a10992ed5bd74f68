//! Settings for background refreshes.

use std::time::Duration;

/// Configuration for the [`OffloadManager`](super::OffloadManager).
///
/// By default refreshes run unbounded and at most one refresh per request
/// identity is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffloadConfig {
    /// Upper bound on a single refresh. A refresh still running at this
    /// point is dropped and its store write never happens.
    pub refresh_timeout: Option<Duration>,
    /// Skip a refresh when one for the same request is already in flight.
    pub deduplicate: bool,
}

impl Default for OffloadConfig {
    fn default() -> Self {
        Self {
            refresh_timeout: None,
            deduplicate: true,
        }
    }
}

impl OffloadConfig {
    /// Starts from the defaults.
    pub fn builder() -> OffloadConfigBuilder {
        OffloadConfigBuilder::default()
    }
}

/// Builder for [`OffloadConfig`].
#[derive(Debug, Clone, Default)]
pub struct OffloadConfigBuilder {
    config: OffloadConfig,
}

impl OffloadConfigBuilder {
    /// Drops any refresh still running after `timeout`.
    pub fn refresh_timeout(mut self, timeout: Duration) -> Self {
        self.config.refresh_timeout = Some(timeout);
        self
    }

    /// Enables or disables one-refresh-per-request deduplication.
    pub fn deduplicate(mut self, enabled: bool) -> Self {
        self.config.deduplicate = enabled;
        self
    }

    /// Finishes the configuration.
    pub fn build(self) -> OffloadConfig {
        self.config
    }
}
