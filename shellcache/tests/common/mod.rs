//! Shared fixtures for engine tests.
#![allow(dead_code)]

use std::future::{Ready, ready};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use shellcache::{
    DeleteStatus, FetchRequest, RequestIdentity, ResponseSnapshot, Store, StoreError,
    StoreHandle, StoreManager, StoreName, Upstream, UpstreamError, UpstreamResult,
};
use shellcache_backend::StoreResult;
use url::Url;

pub const ORIGIN: &str = "https://app.test";

pub fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

/// Route logs through the test harness, once per binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Upstream answering from a mutable table and counting calls per URL.
///
/// Unknown URLs behave as if the network were down.
#[derive(Clone, Debug, Default)]
pub struct MockUpstream {
    replies: Arc<DashMap<Url, Option<ResponseSnapshot>>>,
    calls: Arc<DashMap<Url, usize>>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: Url, response: ResponseSnapshot) -> Self {
        self.set(url, response);
        self
    }

    pub fn fail(self, url: Url) -> Self {
        self.go_offline(url);
        self
    }

    /// Replace the reply for `url`.
    pub fn set(&self, url: Url, response: ResponseSnapshot) {
        self.replies.insert(url, Some(response));
    }

    /// Make every later fetch of `url` fail.
    pub fn go_offline(&self, url: Url) {
        self.replies.insert(url, None);
    }

    pub fn calls(&self, url: &Url) -> usize {
        self.calls.get(url).map_or(0, |count| *count)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|entry| *entry.value()).sum()
    }
}

impl Upstream for MockUpstream {
    type Future = Ready<UpstreamResult>;

    fn call(&mut self, request: FetchRequest) -> Self::Future {
        let url = request.url().clone();
        *self.calls.entry(url.clone()).or_insert(0) += 1;
        let reply = self.replies.get(&url).and_then(|reply| reply.value().clone());
        ready(reply.ok_or(UpstreamError::Offline(url)))
    }
}

/// Store manager whose storage is gone: every operation fails.
#[derive(Clone, Debug, Default)]
pub struct UnavailableStoreManager;

fn unavailable() -> StoreError {
    StoreError::Unavailable("storage disabled".into())
}

#[async_trait]
impl StoreManager for UnavailableStoreManager {
    async fn open(&self, _name: &StoreName) -> StoreResult<StoreHandle> {
        Err(unavailable())
    }

    async fn keys(&self) -> StoreResult<Vec<StoreName>> {
        Err(unavailable())
    }

    async fn delete(&self, _name: &StoreName) -> StoreResult<DeleteStatus> {
        Err(unavailable())
    }
}

fn io_error() -> StoreError {
    StoreError::Internal("disk I/O error".into())
}

/// Store that exists but fails every read and write.
#[derive(Debug)]
pub struct BrokenStore {
    name: StoreName,
}

impl BrokenStore {
    pub fn handle(name: &StoreName) -> StoreHandle {
        Arc::new(Self { name: name.clone() })
    }
}

#[async_trait]
impl Store for BrokenStore {
    fn name(&self) -> &StoreName {
        &self.name
    }

    async fn get(&self, _identity: &RequestIdentity) -> StoreResult<Option<ResponseSnapshot>> {
        Err(io_error())
    }

    async fn put(&self, _identity: RequestIdentity, _snapshot: ResponseSnapshot) -> StoreResult<()> {
        Err(io_error())
    }

    async fn remove(&self, _identity: &RequestIdentity) -> StoreResult<DeleteStatus> {
        Err(io_error())
    }

    async fn keys(&self) -> StoreResult<Vec<RequestIdentity>> {
        Err(io_error())
    }
}

/// Store manager whose stores open fine but fail on every access.
#[derive(Clone, Debug, Default)]
pub struct BrokenStoreManager;

#[async_trait]
impl StoreManager for BrokenStoreManager {
    async fn open(&self, name: &StoreName) -> StoreResult<StoreHandle> {
        Ok(BrokenStore::handle(name))
    }

    async fn keys(&self) -> StoreResult<Vec<StoreName>> {
        Ok(Vec::new())
    }

    async fn delete(&self, _name: &StoreName) -> StoreResult<DeleteStatus> {
        Ok(DeleteStatus::Missing)
    }

    async fn has(&self, _name: &StoreName) -> StoreResult<bool> {
        Ok(true)
    }
}
