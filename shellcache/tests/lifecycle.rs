mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use shellcache::{
    Directive, FetchRequest, Generation, GenerationTag, LifecycleController, LifecycleState,
    MemoryStoreManager, RequestIdentity, ResponseSnapshot, ShellConfig, ShellError, Store,
    StoreManager, StoreName,
};

use common::{MockUpstream, UnavailableStoreManager, init_tracing, url};

fn generation(tag: &str) -> Generation {
    Generation::new("shell", GenerationTag::new(tag))
}

fn shell_upstream() -> MockUpstream {
    MockUpstream::new()
        .respond(url("/"), ResponseSnapshot::ok("<html>root</html>"))
        .respond(url("/index.html"), ResponseSnapshot::ok("<html>index</html>"))
}

fn shell_assets() -> Vec<FetchRequest> {
    vec![FetchRequest::get(url("/")), FetchRequest::get(url("/index.html"))]
}

#[tokio::test]
async fn install_then_activate_reaches_active() {
    init_tracing();
    let manager = MemoryStoreManager::new();
    let controller = LifecycleController::new(
        manager.clone(),
        shell_upstream(),
        generation("v1"),
        shell_assets(),
        true,
    );
    let mut states = controller.subscribe();
    assert_eq!(controller.state(), LifecycleState::New);

    let installed = controller.install().await.unwrap();
    assert_eq!(installed.stored, 2);
    assert_eq!(installed.directives, vec![Directive::SkipWaiting]);
    assert_eq!(controller.state(), LifecycleState::Waiting);
    assert!(states.has_changed().unwrap());
    assert_eq!(*states.borrow_and_update(), LifecycleState::Waiting);

    let activated = controller.activate().await.unwrap();
    assert_eq!(activated.directives, vec![Directive::ClaimClients]);
    assert!(controller.is_active());

    let precache = manager.open(&StoreName::new("shell-precache-v1")).await.unwrap();
    assert_eq!(
        precache.get(&RequestIdentity::get(url("/index.html"))).await.unwrap(),
        Some(ResponseSnapshot::ok("<html>index</html>"))
    );
}

#[tokio::test]
async fn install_without_skip_waiting_issues_no_directive() {
    let controller = LifecycleController::new(
        MemoryStoreManager::new(),
        shell_upstream(),
        generation("v1"),
        shell_assets(),
        false,
    );

    let installed = controller.install().await.unwrap();
    assert!(installed.directives.is_empty());
}

#[tokio::test]
async fn activation_keeps_exactly_current_generation_stores() {
    let manager = MemoryStoreManager::new();
    let v1 = generation("v1");
    manager.open(v1.precache()).await.unwrap();
    manager.open(v1.runtime()).await.unwrap();
    manager.open(&StoreName::new("shell-precache-v0")).await.unwrap();

    let controller =
        LifecycleController::new(manager.clone(), shell_upstream(), v1.clone(), shell_assets(), true);
    controller.install().await.unwrap();
    let activated = controller.activate().await.unwrap();

    assert_eq!(activated.deleted, vec![StoreName::new("shell-precache-v0")]);
    assert_eq!(
        manager.keys().await.unwrap(),
        vec![v1.precache().clone(), v1.runtime().clone()]
    );
}

#[tokio::test]
async fn activation_deletes_by_exact_name_only() {
    let manager = MemoryStoreManager::new();
    let v1 = generation("v1");
    for name in ["shell-precache-v1-old", "shell-runtime-v10", "other-app-runtime-v1"] {
        manager.open(&StoreName::new(name)).await.unwrap();
    }

    let controller =
        LifecycleController::new(manager.clone(), shell_upstream(), v1.clone(), shell_assets(), true);
    controller.install().await.unwrap();
    let activated = controller.activate().await.unwrap();

    assert_eq!(activated.deleted.len(), 3);
    assert_eq!(
        manager.keys().await.unwrap(),
        vec![v1.precache().clone(), v1.runtime().clone()]
    );
}

#[tokio::test]
async fn failed_install_leaves_no_precache_store() {
    let manager = MemoryStoreManager::new();
    let upstream = MockUpstream::new()
        .respond(url("/"), ResponseSnapshot::ok("<html>root</html>"))
        .fail(url("/index.html"));
    let v1 = generation("v1");
    let controller =
        LifecycleController::new(manager.clone(), upstream, v1.clone(), shell_assets(), true);

    let error = controller.install().await.unwrap_err();

    assert!(matches!(error, ShellError::Populate(_)));
    assert_eq!(controller.state(), LifecycleState::Redundant);
    assert!(!manager.has(v1.precache()).await.unwrap());
}

#[tokio::test]
async fn failed_install_keeps_precache_store_it_did_not_create() {
    let manager = MemoryStoreManager::new();
    let v1 = generation("v1");
    let first =
        LifecycleController::new(manager.clone(), shell_upstream(), v1.clone(), shell_assets(), true);
    first.install().await.unwrap();

    let broken = MockUpstream::new()
        .respond(url("/"), ResponseSnapshot::ok("<html>root</html>"))
        .fail(url("/index.html"));
    let second = LifecycleController::new(manager.clone(), broken, v1.clone(), shell_assets(), true);
    second.install().await.unwrap_err();

    assert_eq!(second.state(), LifecycleState::Redundant);
    let precache = manager.open_existing(v1.precache()).await.unwrap().unwrap();
    assert_eq!(
        precache.get(&RequestIdentity::get(url("/index.html"))).await.unwrap(),
        Some(ResponseSnapshot::ok("<html>index</html>"))
    );
}

#[tokio::test]
async fn install_creates_empty_runtime_store() {
    let manager = MemoryStoreManager::new();
    let v1 = generation("v1");
    let controller =
        LifecycleController::new(manager.clone(), shell_upstream(), v1.clone(), shell_assets(), true);

    controller.install().await.unwrap();

    let runtime = manager.open_existing(v1.runtime()).await.unwrap().unwrap();
    assert!(runtime.keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_install_can_be_retried() {
    let manager = MemoryStoreManager::new();
    let upstream = MockUpstream::new()
        .respond(url("/"), ResponseSnapshot::ok("<html>root</html>"))
        .fail(url("/index.html"));
    let controller = LifecycleController::new(
        manager.clone(),
        upstream.clone(),
        generation("v1"),
        shell_assets(),
        true,
    );
    controller.install().await.unwrap_err();

    upstream.set(url("/index.html"), ResponseSnapshot::ok("<html>index</html>"));
    controller.install().await.unwrap();

    assert_eq!(controller.state(), LifecycleState::Waiting);
}

#[tokio::test]
async fn activate_before_install_is_rejected() {
    let controller = LifecycleController::new(
        MemoryStoreManager::new(),
        shell_upstream(),
        generation("v1"),
        shell_assets(),
        true,
    );

    match controller.activate().await.unwrap_err() {
        ShellError::InvalidState { operation, state } => {
            assert_eq!(operation, "activate");
            assert_eq!(state, LifecycleState::New);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn install_twice_is_rejected() {
    let controller = LifecycleController::new(
        MemoryStoreManager::new(),
        shell_upstream(),
        generation("v1"),
        shell_assets(),
        true,
    );
    controller.install().await.unwrap();

    assert!(matches!(
        controller.install().await.unwrap_err(),
        ShellError::InvalidState { .. }
    ));
}

#[tokio::test]
async fn install_fails_when_storage_is_unavailable() {
    let controller = LifecycleController::new(
        UnavailableStoreManager,
        shell_upstream(),
        generation("v1"),
        shell_assets(),
        true,
    );

    assert!(matches!(
        controller.install().await.unwrap_err(),
        ShellError::Store(_)
    ));
    assert_eq!(controller.state(), LifecycleState::Redundant);
}

#[tokio::test]
async fn controller_from_config_uses_configured_names() {
    let config = ShellConfig::from_yaml(
        r#"
origin: "https://app.test"
cache_prefix: "pdf-tool"
version: "v3"
precache: ["/", "/index.html"]
"#,
    )
    .unwrap();
    let manager = Arc::new(MemoryStoreManager::new());

    let controller =
        LifecycleController::from_config(manager.clone(), shell_upstream(), &config).unwrap();
    controller.install().await.unwrap();

    assert_eq!(
        manager.keys().await.unwrap(),
        vec![
            StoreName::new("pdf-tool-precache-v3"),
            StoreName::new("pdf-tool-runtime-v3"),
        ]
    );
}
