mod common;

use http::StatusCode;
use pretty_assertions::assert_eq;
use shellcache::{
    CacheFirst, FetchRequest, MemoryStoreManager, NetworkFirst, OffloadManager, RequestIdentity,
    ResponseKind, ResponseSnapshot, ResponseSource, ShellError, StaleWhileRevalidate, Store,
    StoreHandle, StoreManager, StoreName, Strategy,
};

use common::{BrokenStore, MockUpstream, init_tracing, url};

async fn store(manager: &MemoryStoreManager, name: &str) -> StoreHandle {
    manager.open(&StoreName::new(name)).await.unwrap()
}

#[tokio::test]
async fn cache_first_fetches_once_and_stores_one_entry() {
    let target = url("https://fonts.test/inter.woff2");
    let upstream = MockUpstream::new().respond(target.clone(), ResponseSnapshot::ok("font"));
    let manager = MemoryStoreManager::new();
    let runtime = store(&manager, "shell-runtime-v1").await;

    let first = CacheFirst
        .resolve(FetchRequest::get(target.clone()), &runtime, &upstream)
        .await
        .unwrap();
    let second = CacheFirst
        .resolve(FetchRequest::get(target.clone()), &runtime, &upstream)
        .await
        .unwrap();

    assert_eq!(first.source, ResponseSource::Network);
    assert_eq!(second.source, ResponseSource::Cache);
    assert_eq!(second.response, ResponseSnapshot::ok("font"));
    assert_eq!(upstream.calls(&target), 1);
    assert_eq!(
        runtime.keys().await.unwrap(),
        vec![RequestIdentity::get(target)]
    );
}

#[tokio::test]
async fn cache_first_stores_opaque_responses() {
    let target = url("https://cdn.test/lib.js");
    let upstream = MockUpstream::new().respond(target.clone(), ResponseSnapshot::opaque());
    let manager = MemoryStoreManager::new();
    let runtime = store(&manager, "runtime").await;

    CacheFirst
        .resolve(FetchRequest::get(target.clone()), &runtime, &upstream)
        .await
        .unwrap();

    let cached = runtime.get(&RequestIdentity::get(target)).await.unwrap().unwrap();
    assert_eq!(cached.kind(), ResponseKind::Opaque);
}

#[tokio::test]
async fn cache_first_returns_but_never_stores_unusable_responses() {
    let missing = url("/missing.png");
    let moved = url("/moved.css");
    let upstream = MockUpstream::new()
        .respond(missing.clone(), ResponseSnapshot::new(StatusCode::NOT_FOUND, "nope"))
        .respond(moved.clone(), ResponseSnapshot::ok("moved").with_redirected(true));
    let manager = MemoryStoreManager::new();
    let runtime = store(&manager, "runtime").await;

    let served = CacheFirst
        .resolve(FetchRequest::get(missing), &runtime, &upstream)
        .await
        .unwrap();
    assert_eq!(served.response.status(), StatusCode::NOT_FOUND);
    CacheFirst
        .resolve(FetchRequest::get(moved), &runtime, &upstream)
        .await
        .unwrap();

    assert!(runtime.keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn cache_first_fails_offline_on_miss() {
    let manager = MemoryStoreManager::new();
    let runtime = store(&manager, "runtime").await;

    let error = CacheFirst
        .resolve(FetchRequest::get(url("/app.js")), &runtime, &MockUpstream::new())
        .await
        .unwrap_err();

    assert!(matches!(error, ShellError::Network(_)));
}

#[tokio::test]
async fn network_first_writes_through() {
    let page = url("/reports");
    let upstream = MockUpstream::new().respond(page.clone(), ResponseSnapshot::ok("fresh"));
    let manager = MemoryStoreManager::new();
    let runtime = store(&manager, "runtime").await;

    let served = NetworkFirst::new()
        .resolve(FetchRequest::navigate(page.clone()), &runtime, &upstream)
        .await
        .unwrap();

    assert_eq!(served.source, ResponseSource::Network);
    assert_eq!(
        runtime.get(&RequestIdentity::get(page)).await.unwrap(),
        Some(ResponseSnapshot::ok("fresh"))
    );
}

#[tokio::test]
async fn network_first_serves_stale_entry_offline() {
    init_tracing();
    let page = url("/");
    let manager = MemoryStoreManager::new();
    let runtime = store(&manager, "runtime").await;
    runtime
        .put(RequestIdentity::get(page.clone()), ResponseSnapshot::ok("stale"))
        .await
        .unwrap();

    let served = NetworkFirst::new()
        .resolve(
            FetchRequest::navigate(page.clone()),
            &runtime,
            &MockUpstream::new().fail(page),
        )
        .await
        .unwrap();

    assert_eq!(served.source, ResponseSource::Cache);
    assert_eq!(served.response, ResponseSnapshot::ok("stale"));
}

#[tokio::test]
async fn network_first_falls_back_to_shell_document() {
    let manager = MemoryStoreManager::new();
    let runtime = store(&manager, "runtime").await;
    let precache = store(&manager, "precache").await;
    let root = RequestIdentity::get(url("/"));
    precache
        .put(root.clone(), ResponseSnapshot::ok("<html>shell</html>"))
        .await
        .unwrap();

    let served = NetworkFirst::with_fallback(precache, root)
        .resolve(
            FetchRequest::navigate(url("/settings")),
            &runtime,
            &MockUpstream::new(),
        )
        .await
        .unwrap();

    assert_eq!(served.source, ResponseSource::Fallback);
    assert_eq!(served.response, ResponseSnapshot::ok("<html>shell</html>"));
}

#[tokio::test]
async fn network_first_fails_without_any_fallback() {
    let manager = MemoryStoreManager::new();
    let runtime = store(&manager, "runtime").await;
    let precache = store(&manager, "precache").await;

    let error = NetworkFirst::with_fallback(precache, RequestIdentity::get(url("/")))
        .resolve(
            FetchRequest::navigate(url("/settings")),
            &runtime,
            &MockUpstream::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(error, ShellError::Network(_)));
}

#[tokio::test]
async fn stale_while_revalidate_serves_cached_then_refreshed() {
    let asset = url("/app.js");
    let identity = RequestIdentity::get(asset.clone());
    let upstream = MockUpstream::new().respond(asset.clone(), ResponseSnapshot::ok("F"));
    let manager = MemoryStoreManager::new();
    let precache = store(&manager, "precache").await;
    precache
        .put(identity.clone(), ResponseSnapshot::ok("E"))
        .await
        .unwrap();
    let offload = OffloadManager::default();
    let strategy = StaleWhileRevalidate::new(offload.clone());

    let first = strategy
        .resolve(FetchRequest::get(asset.clone()), &precache, &upstream)
        .await
        .unwrap();
    assert_eq!(first.response, ResponseSnapshot::ok("E"));
    assert_eq!(first.source, ResponseSource::Cache);

    offload.wait_all().await;

    let second = strategy
        .resolve(FetchRequest::get(asset.clone()), &precache, &upstream)
        .await
        .unwrap();
    assert_eq!(second.response, ResponseSnapshot::ok("F"));
    offload.wait_all().await;
    assert_eq!(upstream.calls(&asset), 2);
}

#[tokio::test]
async fn stale_while_revalidate_fetches_inline_on_miss() {
    let asset = url("/app.css");
    let upstream = MockUpstream::new().respond(asset.clone(), ResponseSnapshot::ok("css"));
    let manager = MemoryStoreManager::new();
    let precache = store(&manager, "precache").await;
    let offload = OffloadManager::default();

    let served = StaleWhileRevalidate::new(offload.clone())
        .resolve(FetchRequest::get(asset.clone()), &precache, &upstream)
        .await
        .unwrap();

    assert_eq!(served.source, ResponseSource::Network);
    assert_eq!(offload.active_task_count(), 0);
    assert_eq!(
        precache.get(&RequestIdentity::get(asset)).await.unwrap(),
        Some(ResponseSnapshot::ok("css"))
    );
}

#[tokio::test]
async fn stale_while_revalidate_swallows_refresh_failure() {
    let asset = url("/app.js");
    let identity = RequestIdentity::get(asset.clone());
    let manager = MemoryStoreManager::new();
    let precache = store(&manager, "precache").await;
    precache
        .put(identity.clone(), ResponseSnapshot::ok("E"))
        .await
        .unwrap();
    let offload = OffloadManager::default();

    let served = StaleWhileRevalidate::new(offload.clone())
        .resolve(
            FetchRequest::get(asset.clone()),
            &precache,
            &MockUpstream::new().fail(asset),
        )
        .await
        .unwrap();
    offload.wait_all().await;

    assert_eq!(served.response, ResponseSnapshot::ok("E"));
    assert_eq!(
        precache.get(&identity).await.unwrap(),
        Some(ResponseSnapshot::ok("E"))
    );
}

#[tokio::test]
async fn stale_while_revalidate_fails_offline_on_miss() {
    let manager = MemoryStoreManager::new();
    let precache = store(&manager, "precache").await;

    let error = StaleWhileRevalidate::new(OffloadManager::default())
        .resolve(FetchRequest::get(url("/app.js")), &precache, &MockUpstream::new())
        .await
        .unwrap_err();

    assert!(matches!(error, ShellError::Network(_)));
}

#[tokio::test]
async fn failing_store_read_is_a_miss_and_failed_write_is_swallowed() {
    init_tracing();
    let target = url("/app.js");
    let upstream = MockUpstream::new().respond(target.clone(), ResponseSnapshot::ok("app"));
    let broken = BrokenStore::handle(&StoreName::new("shell-runtime-v1"));

    let cache_first = CacheFirst
        .resolve(FetchRequest::get(target.clone()), &broken, &upstream)
        .await
        .unwrap();
    let network_first = NetworkFirst::new()
        .resolve(FetchRequest::get(target.clone()), &broken, &upstream)
        .await
        .unwrap();
    let revalidate = StaleWhileRevalidate::new(OffloadManager::default())
        .resolve(FetchRequest::get(target.clone()), &broken, &upstream)
        .await
        .unwrap();

    for served in [cache_first, network_first, revalidate] {
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(served.response, ResponseSnapshot::ok("app"));
    }
    assert_eq!(upstream.calls(&target), 3);
}

#[tokio::test]
async fn failing_store_offline_surfaces_the_network_error() {
    let target = url("/app.js");
    let broken = BrokenStore::handle(&StoreName::new("shell-runtime-v1"));

    let error = NetworkFirst::new()
        .resolve(
            FetchRequest::get(target.clone()),
            &broken,
            &MockUpstream::new().fail(target),
        )
        .await
        .unwrap_err();

    assert!(matches!(error, ShellError::Network(_)));
}
