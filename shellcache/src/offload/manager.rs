//! OffloadManager implementation for background task execution.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use shellcache_core::{Offload, RequestIdentity};
use smol_str::SmolStr;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info_span, warn};

use super::policy::OffloadConfig;

#[cfg(feature = "metrics")]
use crate::metrics::{
    OFFLOAD_TASK_DURATION, OFFLOAD_TASKS_ACTIVE, OFFLOAD_TASKS_COMPLETED,
    OFFLOAD_TASKS_DEDUPLICATED, OFFLOAD_TASKS_SPAWNED, OFFLOAD_TASKS_TIMEOUT,
};

/// Key of a tracked background task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OffloadKey {
    /// Refresh of one request identity; deduplicated.
    Request(RequestIdentity),
    /// Any other task, keyed by kind and a per-manager counter.
    Generated {
        /// Kind of the task (e.g. "revalidate").
        kind: SmolStr,
        /// Unique identifier within the manager.
        id: u64,
    },
}

impl OffloadKey {
    /// Label used for tracing and metrics.
    pub fn key_type(&self) -> SmolStr {
        match self {
            Self::Request(_) => SmolStr::new_static("revalidate"),
            Self::Generated { kind, .. } => kind.clone(),
        }
    }
}

impl From<RequestIdentity> for OffloadKey {
    fn from(identity: RequestIdentity) -> Self {
        Self::Request(identity)
    }
}

#[derive(Debug)]
struct OffloadManagerInner {
    config: OffloadConfig,
    tasks: DashMap<OffloadKey, JoinHandle<()>>,
    key_counter: AtomicU64,
}

/// Tracks background tasks until they complete.
///
/// Clones share one set of in-flight tasks. Must be used from within a tokio
/// runtime.
#[derive(Clone, Debug)]
pub struct OffloadManager {
    inner: Arc<OffloadManagerInner>,
}

impl OffloadManager {
    /// Create a new OffloadManager with the given configuration.
    pub fn new(config: OffloadConfig) -> Self {
        Self {
            inner: Arc::new(OffloadManagerInner {
                config,
                tasks: DashMap::new(),
                key_counter: AtomicU64::new(0),
            }),
        }
    }

    /// Create a new OffloadManager with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(OffloadConfig::default())
    }

    fn next_key(&self, kind: impl Into<SmolStr>) -> OffloadKey {
        let id = self.inner.key_counter.fetch_add(1, Ordering::Relaxed);
        OffloadKey::Generated {
            kind: kind.into(),
            id,
        }
    }

    /// Spawn a task under a fresh key of the given kind.
    pub fn spawn<F>(&self, kind: impl Into<SmolStr>, task: F) -> OffloadKey
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key = self.next_key(kind);
        self.spawn_with_key(key.clone(), task);
        key
    }

    /// Spawn a task under `key`.
    ///
    /// With deduplication enabled, a [`OffloadKey::Request`] task is skipped
    /// while another task for the same request is still running.
    ///
    /// Returns `true` if the task was spawned, `false` if it was skipped.
    pub fn spawn_with_key<K, F>(&self, key: K, task: F) -> bool
    where
        K: Into<OffloadKey>,
        F: Future<Output = ()> + Send + 'static,
    {
        let key = key.into();

        // The entry lock is held across the spawn so the task cannot remove
        // its own key before the handle is recorded.
        match self.inner.tasks.entry(key.clone()) {
            Entry::Occupied(entry)
                if self.inner.config.deduplicate
                    && matches!(key, OffloadKey::Request(_))
                    && !entry.get().is_finished() =>
            {
                debug!(?key, "refresh already in flight");
                #[cfg(feature = "metrics")]
                metrics::counter!(*OFFLOAD_TASKS_DEDUPLICATED, "key_type" => key.key_type().to_string())
                    .increment(1);
                false
            }
            Entry::Occupied(mut entry) => {
                entry.insert(self.spawn_inner(task, key));
                true
            }
            Entry::Vacant(entry) => {
                entry.insert(self.spawn_inner(task, key));
                true
            }
        }
    }

    /// Number of tracked tasks that have not finished.
    pub fn active_task_count(&self) -> usize {
        self.inner.tasks.iter().filter(|e| !e.is_finished()).count()
    }

    /// Drop handles of finished tasks.
    pub fn cleanup_finished(&self) {
        self.inner.tasks.retain(|_, handle| !handle.is_finished());
    }

    /// Whether a task tracked under `key` is still running.
    pub fn is_in_flight(&self, key: &OffloadKey) -> bool {
        self.inner.tasks.get(key).is_some_and(|h| !h.is_finished())
    }

    /// Wait until every tracked task has finished.
    ///
    /// Tasks spawned while waiting are waited for as well.
    pub async fn wait_all(&self) {
        loop {
            self.cleanup_finished();
            if self.inner.tasks.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
    }

    /// Like [`wait_all`](Self::wait_all), but gives up after `timeout`.
    ///
    /// Returns `false` if refreshes were still running when it gave up; they
    /// keep running.
    pub async fn wait_all_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait_all()).await.is_ok()
    }

    fn spawn_inner<F>(&self, task: F, key: OffloadKey) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let refresh_timeout = self.inner.config.refresh_timeout;
        let inner = self.inner.clone();
        let key_type = key.key_type();

        #[cfg(feature = "metrics")]
        {
            metrics::counter!(*OFFLOAD_TASKS_SPAWNED, "key_type" => key_type.to_string())
                .increment(1);
            metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "key_type" => key_type.to_string())
                .increment(1.0);
        }

        let span = info_span!("offload_task", key_type = %key_type, key = ?key);

        tokio::spawn(
            async move {
                let start = Instant::now();
                let completed = match refresh_timeout {
                    None => {
                        task.await;
                        true
                    }
                    Some(limit) => match tokio::time::timeout(limit, task).await {
                        Ok(()) => true,
                        Err(_) => {
                            warn!(?key, limit_ms = limit.as_millis(), "refresh dropped after timeout");
                            false
                        }
                    },
                };
                inner.tasks.remove(&key);
                Self::record_finish(start, &key_type, completed);
            }
            .instrument(span),
        )
    }

    #[cfg(feature = "metrics")]
    fn record_finish(start: Instant, key_type: &SmolStr, completed: bool) {
        let counter = if completed {
            *OFFLOAD_TASKS_COMPLETED
        } else {
            *OFFLOAD_TASKS_TIMEOUT
        };
        metrics::counter!(counter, "key_type" => key_type.to_string()).increment(1);
        metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "key_type" => key_type.to_string()).decrement(1.0);
        metrics::histogram!(*OFFLOAD_TASK_DURATION, "key_type" => key_type.to_string())
            .record(start.elapsed().as_secs_f64());
    }

    #[cfg(not(feature = "metrics"))]
    fn record_finish(_start: Instant, _key_type: &SmolStr, _completed: bool) {}
}

impl Default for OffloadManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Offload for OffloadManager {
    fn spawn<F>(&self, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        OffloadManager::spawn(self, kind, future);
    }

    fn spawn_for<F>(&self, identity: RequestIdentity, future: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.inner.config.deduplicate {
            self.spawn_with_key(identity, future)
        } else {
            OffloadManager::spawn(self, "revalidate", future);
            true
        }
    }
}
