//! Install and activation of one deployment generation.
//!
//! ```text
//! New ──install──▶ Installing ──ok──▶ Waiting ──activate──▶ Activating ──ok──▶ Active
//!                      │                  ▲                      │
//!                      └──err──▶ Redundant└───────────err────────┘
//! ```
//!
//! A failed install leaves the generation [`Redundant`](LifecycleState::Redundant);
//! the host may call [`install`](LifecycleController::install) again. A failed
//! activation returns to [`Waiting`](LifecycleState::Waiting) so it can be
//! retried.
//!
//! Both operations are futures the host must keep alive until they settle;
//! the returned [`Directive`]s replace the platform's takeover calls.

use std::fmt;

use shellcache_backend::{PopulateExt, StoreManager};
use shellcache_core::{FetchRequest, Generation, StoreName, Upstream};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::{ConfigError, ShellConfig};
use crate::error::ShellError;
use crate::metrics::record_stores_deleted;

/// Lifecycle state of one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Not installed yet.
    New,
    /// Precaching is in progress.
    Installing,
    /// Installed; waiting to be activated.
    Waiting,
    /// Stale stores are being deleted.
    Activating,
    /// Serving requests.
    Active,
    /// Install failed; this generation will never serve.
    Redundant,
}

impl LifecycleState {
    /// Lowercase name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Installing => "installing",
            Self::Waiting => "waiting",
            Self::Activating => "activating",
            Self::Active => "active",
            Self::Redundant => "redundant",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Takeover requests handed back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    /// Activate without waiting for clients of the previous generation to
    /// close.
    SkipWaiting,
    /// Route already-open clients through this generation from their next
    /// request on.
    ClaimClients,
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Number of entries written to the precache store.
    pub stored: usize,
    /// Directives the host should honor.
    pub directives: Vec<Directive>,
}

/// Result of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateOutcome {
    /// Stores deleted because this generation does not own them.
    pub deleted: Vec<StoreName>,
    /// Directives the host should honor.
    pub directives: Vec<Directive>,
}

/// Drives install and activation of one generation.
pub struct LifecycleController<M, U> {
    manager: M,
    upstream: U,
    generation: Generation,
    precache: Vec<FetchRequest>,
    skip_waiting: bool,
    state: watch::Sender<LifecycleState>,
}

impl<M, U> LifecycleController<M, U>
where
    M: StoreManager,
    U: Upstream,
{
    /// Creates a controller in the [`New`](LifecycleState::New) state.
    pub fn new(
        manager: M,
        upstream: U,
        generation: Generation,
        precache: Vec<FetchRequest>,
        skip_waiting: bool,
    ) -> Self {
        let (state, _) = watch::channel(LifecycleState::New);
        Self {
            manager,
            upstream,
            generation,
            precache,
            skip_waiting,
            state,
        }
    }

    /// Creates a controller for the generation described by `config`.
    pub fn from_config(manager: M, upstream: U, config: &ShellConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            manager,
            upstream,
            config.generation(),
            config.precache_requests()?,
            config.skip_waiting,
        ))
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Receiver observing every state change.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// The generation this controller deploys.
    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    /// Whether the generation is serving.
    pub fn is_active(&self) -> bool {
        self.state() == LifecycleState::Active
    }

    fn transition(&self, next: LifecycleState) {
        let previous = self.state.send_replace(next);
        info!(
            generation = %self.generation.tag(),
            from = %previous,
            to = %next,
            "lifecycle transition"
        );
    }

    fn expect_state(
        &self,
        operation: &'static str,
        allowed: &[LifecycleState],
    ) -> Result<(), ShellError> {
        let state = self.state();
        if allowed.contains(&state) {
            Ok(())
        } else {
            Err(ShellError::InvalidState { operation, state })
        }
    }

    /// Opens the precache store, fills it with the precache list and creates
    /// the empty runtime store.
    ///
    /// Fails if any entry cannot be fetched or is not cacheable. On failure a
    /// precache store created by this call is deleted, so no partially filled
    /// store of this generation survives, and the state becomes
    /// [`Redundant`](LifecycleState::Redundant). A precache store that
    /// already existed before the call is left as it was.
    ///
    /// With `skip_waiting` set, the outcome carries
    /// [`Directive::SkipWaiting`]. Activating right away favors fast rollout
    /// over mid-session consistency: open tabs may briefly combine an old
    /// document with new assets.
    pub async fn install(&self) -> Result<InstallOutcome, ShellError> {
        self.expect_state("install", &[LifecycleState::New, LifecycleState::Redundant])?;
        self.transition(LifecycleState::Installing);

        let precache = self.generation.precache();
        // Unknown counts as existing: never delete what may not be ours.
        let created = !self.manager.has(precache).await.unwrap_or(true);

        match self.prepare_stores().await {
            Ok(stored) => {
                self.transition(LifecycleState::Waiting);
                let directives = if self.skip_waiting {
                    vec![Directive::SkipWaiting]
                } else {
                    Vec::new()
                };
                Ok(InstallOutcome { stored, directives })
            }
            Err(error) => {
                warn!(generation = %self.generation.tag(), %error, "install failed");
                if created {
                    if let Err(cleanup) = self.manager.delete(precache).await {
                        warn!(store = %precache, error = %cleanup, "failed to discard partial precache");
                    }
                }
                self.transition(LifecycleState::Redundant);
                Err(error)
            }
        }
    }

    async fn prepare_stores(&self) -> Result<usize, ShellError> {
        let store = self.manager.open(self.generation.precache()).await?;
        info!(store = %store.name(), entries = self.precache.len(), "cache opened");
        let stored = store
            .populate(&self.upstream, self.precache.clone())
            .await?;
        let runtime = self.manager.open(self.generation.runtime()).await?;
        info!(store = %runtime.name(), "cache opened");
        Ok(stored)
    }

    /// Deletes every store this generation does not own, then claims
    /// clients.
    ///
    /// Ownership is exact: only this generation's precache and runtime store
    /// names survive. A failure leaves the state at
    /// [`Waiting`](LifecycleState::Waiting); stores already deleted stay
    /// deleted.
    pub async fn activate(&self) -> Result<ActivateOutcome, ShellError> {
        self.expect_state("activate", &[LifecycleState::Waiting])?;
        self.transition(LifecycleState::Activating);

        match self.prune().await {
            Ok(deleted) => {
                record_stores_deleted(deleted.len());
                self.transition(LifecycleState::Active);
                Ok(ActivateOutcome {
                    deleted,
                    directives: vec![Directive::ClaimClients],
                })
            }
            Err(error) => {
                warn!(generation = %self.generation.tag(), %error, "activation failed");
                self.transition(LifecycleState::Waiting);
                Err(error)
            }
        }
    }

    async fn prune(&self) -> Result<Vec<StoreName>, ShellError> {
        let mut deleted = Vec::new();
        for name in self.manager.keys().await? {
            if self.generation.owns(&name) {
                continue;
            }
            info!(store = %name, "deleting stale store");
            if self.manager.delete(&name).await?.is_deleted() {
                deleted.push(name);
            }
        }
        Ok(deleted)
    }
}

impl<M, U> fmt::Debug for LifecycleController<M, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleController")
            .field("generation", &self.generation)
            .field("state", &*self.state.borrow())
            .field("precache", &self.precache.len())
            .field("skip_waiting", &self.skip_waiting)
            .finish_non_exhaustive()
    }
}
