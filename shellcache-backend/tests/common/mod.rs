//! Shared helpers for store tests.

use std::future::{Ready, ready};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use shellcache_backend::{DeleteStatus, Store, StoreError, StoreResult};
use shellcache_core::{
    FetchRequest, RequestIdentity, ResponseSnapshot, StoreName, Upstream, UpstreamError,
    UpstreamResult,
};
use url::Url;

pub fn url(path: &str) -> Url {
    Url::parse("https://app.test").unwrap().join(path).unwrap()
}

#[derive(Clone, Debug)]
enum Reply {
    Respond(ResponseSnapshot),
    Fail,
}

/// Upstream answering from a fixed table; unknown URLs are unreachable.
#[derive(Clone, Debug, Default)]
pub struct MockUpstream {
    replies: Arc<DashMap<Url, Reply>>,
    calls: Arc<AtomicUsize>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: Url, response: ResponseSnapshot) -> Self {
        self.replies.insert(url, Reply::Respond(response));
        self
    }

    pub fn fail(self, url: Url) -> Self {
        self.replies.insert(url, Reply::Fail);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Upstream for MockUpstream {
    type Future = Ready<UpstreamResult>;

    fn call(&mut self, request: FetchRequest) -> Self::Future {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let url = request.url().clone();
        let reply = self.replies.get(&url).map(|reply| reply.value().clone());
        ready(match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail) | None => Err(UpstreamError::Offline(url)),
        })
    }
}

/// Store that accepts a fixed number of writes, then fails every write.
pub struct FlakyStore {
    name: StoreName,
    entries: DashMap<RequestIdentity, ResponseSnapshot>,
    writes_left: AtomicUsize,
}

impl FlakyStore {
    pub fn new(writes: usize) -> Self {
        Self {
            name: StoreName::new("flaky"),
            entries: DashMap::new(),
            writes_left: AtomicUsize::new(writes),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl Store for FlakyStore {
    fn name(&self) -> &StoreName {
        &self.name
    }

    async fn get(&self, identity: &RequestIdentity) -> StoreResult<Option<ResponseSnapshot>> {
        Ok(self.entries.get(identity).map(|e| e.value().clone()))
    }

    async fn put(&self, identity: RequestIdentity, snapshot: ResponseSnapshot) -> StoreResult<()> {
        let left = self.writes_left.load(Ordering::SeqCst);
        if left == 0 {
            return Err(StoreError::Unavailable("quota exceeded".into()));
        }
        self.writes_left.store(left - 1, Ordering::SeqCst);
        self.entries.insert(identity, snapshot);
        Ok(())
    }

    async fn remove(&self, identity: &RequestIdentity) -> StoreResult<DeleteStatus> {
        Ok(match self.entries.remove(identity) {
            Some(_) => DeleteStatus::Deleted,
            None => DeleteStatus::Missing,
        })
    }

    async fn keys(&self) -> StoreResult<Vec<RequestIdentity>> {
        Ok(self.entries.iter().map(|e| e.key().clone()).collect())
    }
}

/// Store whose every operation fails.
pub struct BrokenStore {
    name: StoreName,
}

impl BrokenStore {
    pub fn new(name: &str) -> Self {
        Self {
            name: StoreName::new(name),
        }
    }
}

fn broken() -> StoreError {
    StoreError::Internal("disk I/O error".into())
}

#[async_trait]
impl Store for BrokenStore {
    fn name(&self) -> &StoreName {
        &self.name
    }

    async fn get(&self, _identity: &RequestIdentity) -> StoreResult<Option<ResponseSnapshot>> {
        Err(broken())
    }

    async fn put(&self, _identity: RequestIdentity, _snapshot: ResponseSnapshot) -> StoreResult<()> {
        Err(broken())
    }

    async fn remove(&self, _identity: &RequestIdentity) -> StoreResult<DeleteStatus> {
        Err(broken())
    }

    async fn keys(&self) -> StoreResult<Vec<RequestIdentity>> {
        Err(broken())
    }
}
