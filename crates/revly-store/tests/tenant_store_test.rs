//! Integration tests for the tenant store against the in-memory
//! backend.

use std::sync::Arc;

use revly_core::models::metrics::TenantMetrics;
use revly_core::models::role::Role;
use revly_core::models::tenant::{TenantStatus, UpdateTenant};
use revly_remote::MemoryBackend;
use revly_store::{AppStore, MemoryStateStore, StoreConfig, StoreError};
use uuid::Uuid;

type TestApp = AppStore<MemoryBackend, MemoryBackend, MemoryBackend, Arc<MemoryStateStore>>;

fn build_app(backend: &MemoryBackend, state: &Arc<MemoryStateStore>) -> TestApp {
    build_app_with(backend, state, StoreConfig::default())
}

fn build_app_with(
    backend: &MemoryBackend,
    state: &Arc<MemoryStateStore>,
    config: StoreConfig,
) -> TestApp {
    AppStore::new(
        backend.clone(),
        backend.clone(),
        backend.clone(),
        state.clone(),
        config,
    )
}

/// Seed three tenants, a member of the first, and a platform admin.
fn setup() -> (MemoryBackend, Arc<MemoryStateStore>, TestApp, [Uuid; 3]) {
    let backend = MemoryBackend::new();
    let t1 = backend.add_tenant("Acme Reviews");
    let t2 = backend.add_tenant("Globex Feedback");
    let t3 = backend.add_tenant("Initech Ratings");
    backend.add_user("alice@example.com", "correct-horse", Role::User, Some(t1.id));
    backend.add_user("root@example.com", "admin-password", Role::SuperAdmin, None);

    let state = Arc::new(MemoryStateStore::new());
    let app = build_app(&backend, &state);
    (backend, state, app, [t1.id, t2.id, t3.id])
}

#[tokio::test]
async fn member_sees_singleton_tenant_list() {
    let (_backend, _state, app, [t1, ..]) = setup();
    app.initialize().await;
    app.sign_in("alice@example.com", "correct-horse")
        .await
        .unwrap();

    let snap = app.tenant().snapshot();
    assert_eq!(snap.current.as_ref().unwrap().id, t1);
    assert_eq!(snap.tenants.len(), 1);
    assert_eq!(snap.available.len(), 1);
    assert_eq!(snap.available[0].id, t1);
    assert!(snap.is_tenant_active());
}

#[tokio::test]
async fn platform_admin_sees_full_tenant_list() {
    let (_backend, _state, app, _) = setup();
    app.initialize().await;
    app.sign_in("root@example.com", "admin-password")
        .await
        .unwrap();

    let snap = app.tenant().snapshot();
    assert!(snap.current.is_none());
    assert_eq!(snap.tenants.len(), 3);
    assert_eq!(snap.available.len(), 3);
}

#[tokio::test]
async fn unassigned_member_gets_empty_state_without_error() {
    let (backend, state, _, _) = setup();
    backend.add_user("floater@example.com", "no-tenant-pw", Role::User, None);
    let app = build_app(&backend, &state);
    app.initialize().await;
    app.sign_in("floater@example.com", "no-tenant-pw")
        .await
        .unwrap();

    let snap = app.tenant().snapshot();
    assert!(snap.current.is_none());
    assert!(snap.tenants.is_empty());
    assert!(snap.available.is_empty());
    assert!(snap.error.is_none());
    assert!(!snap.loading);
}

#[tokio::test]
async fn switch_to_uncached_tenant_fails_without_mutation() {
    let (_backend, _state, app, [t1, t2, ..]) = setup();
    app.initialize().await;
    app.sign_in("alice@example.com", "correct-horse")
        .await
        .unwrap();

    // t2 exists remotely but is not in alice's cached list.
    let err = app.tenant().switch_tenant(t2).await.unwrap_err();
    assert!(matches!(err, StoreError::TenantNotFound { id } if id == t2));

    let snap = app.tenant().snapshot();
    assert_eq!(snap.current.as_ref().unwrap().id, t1);
}

#[tokio::test]
async fn switch_refreshes_metrics_for_the_new_tenant() {
    let (backend, _state, app, [_, t2, _]) = setup();
    backend.set_metrics(TenantMetrics {
        tenant_id: t2,
        user_count: 4,
        review_count: 42,
        active_users: 3,
        storage_bytes: 1024,
        api_calls: 99,
        last_activity_at: None,
    });

    app.initialize().await;
    app.sign_in("root@example.com", "admin-password")
        .await
        .unwrap();

    app.tenant().switch_tenant(t2).await.unwrap();

    let snap = app.tenant().snapshot();
    assert_eq!(snap.current.as_ref().unwrap().id, t2);
    let metrics = snap.metrics.unwrap();
    assert_eq!(metrics.tenant_id, t2);
    assert_eq!(metrics.review_count, 42);
    assert!(!snap.switching);
}

#[tokio::test]
async fn update_patches_every_cache_without_a_refetch() {
    let (backend, _state, app, [t1, ..]) = setup();
    app.initialize().await;
    app.sign_in("root@example.com", "admin-password")
        .await
        .unwrap();
    app.tenant().switch_tenant(t1).await.unwrap();

    let fetches_before = (
        backend.current_tenant_fetches(),
        backend.tenant_list_fetches(),
    );

    app.tenant()
        .update_tenant(
            t1,
            UpdateTenant {
                status: Some(TenantStatus::Suspended),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let snap = app.tenant().snapshot();
    assert_eq!(snap.current.as_ref().unwrap().status, TenantStatus::Suspended);
    let in_tenants = snap.tenants.iter().find(|t| t.id == t1).unwrap();
    assert_eq!(in_tenants.status, TenantStatus::Suspended);
    let in_available = snap.available.iter().find(|t| t.id == t1).unwrap();
    assert_eq!(in_available.status, TenantStatus::Suspended);

    // The optimistic patch saved the round-trip.
    assert_eq!(
        (
            backend.current_tenant_fetches(),
            backend.tenant_list_fetches()
        ),
        fetches_before
    );
}

#[tokio::test]
async fn created_tenant_is_immediately_switchable() {
    let (_backend, _state, app, _) = setup();
    app.initialize().await;
    app.sign_in("root@example.com", "admin-password")
        .await
        .unwrap();

    let created = app
        .tenant()
        .create_tenant(revly_core::models::tenant::CreateTenant {
            name: "Umbrella Surveys".into(),
            domain: None,
            plan: revly_core::models::tenant::PlanTier::Free,
            settings: None,
        })
        .await
        .unwrap();

    let snap = app.tenant().snapshot();
    assert!(snap.tenants.iter().any(|t| t.id == created.id));
    assert!(snap.available.iter().any(|t| t.id == created.id));

    app.tenant().switch_tenant(created.id).await.unwrap();
    assert_eq!(app.tenant().snapshot().current.unwrap().id, created.id);
}

#[tokio::test]
async fn deleting_the_active_tenant_clears_it() {
    let (_backend, _state, app, [t1, ..]) = setup();
    app.initialize().await;
    app.sign_in("root@example.com", "admin-password")
        .await
        .unwrap();
    app.tenant().switch_tenant(t1).await.unwrap();

    app.tenant().delete_tenant(t1).await.unwrap();

    let snap = app.tenant().snapshot();
    assert!(snap.current.is_none());
    assert!(snap.metrics.is_none());
    assert!(!snap.tenants.iter().any(|t| t.id == t1));
    assert!(!snap.available.iter().any(|t| t.id == t1));
}

#[tokio::test]
async fn network_error_keeps_cached_tenants() {
    let (backend, _state, app, [t1, ..]) = setup();
    app.initialize().await;
    app.sign_in("alice@example.com", "correct-horse")
        .await
        .unwrap();

    backend.set_offline(true);
    app.tenant().refresh_tenants().await;

    let snap = app.tenant().snapshot();
    assert!(snap.error.is_some());
    assert!(!snap.loading);
    // Previously cached tenants are left untouched.
    assert_eq!(snap.tenants.len(), 1);
    assert_eq!(snap.current.as_ref().unwrap().id, t1);
}

#[tokio::test]
async fn failed_mutation_leaves_caches_untouched() {
    let (backend, _state, app, [t1, ..]) = setup();
    app.initialize().await;
    app.sign_in("root@example.com", "admin-password")
        .await
        .unwrap();

    backend.set_offline(true);
    let err = app
        .tenant()
        .update_tenant(
            t1,
            UpdateTenant {
                status: Some(TenantStatus::Suspended),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Remote(_)));

    let snap = app.tenant().snapshot();
    let cached = snap.tenants.iter().find(|t| t.id == t1).unwrap();
    assert_eq!(cached.status, TenantStatus::Active);
}

#[tokio::test]
async fn metrics_refresh_without_active_tenant_is_a_noop() {
    let (backend, _state, app, _) = setup();
    app.initialize().await;

    app.tenant().refresh_metrics().await;
    assert_eq!(backend.metrics_fetches(), 0);
}

#[tokio::test]
async fn valid_cache_short_circuits_initialization() {
    let (backend, state, app, [t1, ..]) = setup();
    app.initialize().await;
    app.sign_in("alice@example.com", "correct-horse")
        .await
        .unwrap();

    // Fresh process inside the cache window.
    let app2 = build_app(&backend, &state);
    let fetches_before = backend.current_tenant_fetches();
    app2.initialize().await;

    assert_eq!(backend.current_tenant_fetches(), fetches_before);
    let snap = app2.tenant().snapshot();
    assert_eq!(snap.current.as_ref().unwrap().id, t1);
    assert!(!snap.loading);
}

#[tokio::test]
async fn expired_cache_refetches_on_initialization() {
    let (backend, state, app, _) = setup();
    app.initialize().await;
    app.sign_in("alice@example.com", "correct-horse")
        .await
        .unwrap();

    // A zero TTL expires the persisted cache immediately.
    let app2 = build_app_with(
        &backend,
        &state,
        StoreConfig {
            tenant_cache_ttl_secs: 0,
            ..Default::default()
        },
    );
    let fetches_before = backend.current_tenant_fetches();
    app2.initialize().await;

    assert!(backend.current_tenant_fetches() > fetches_before);
}

#[tokio::test]
async fn reset_returns_to_uninitialized_defaults() {
    let (_backend, _state, app, _) = setup();
    app.initialize().await;
    app.sign_in("alice@example.com", "correct-horse")
        .await
        .unwrap();

    app.tenant().reset();

    let snap = app.tenant().snapshot();
    assert!(snap.current.is_none());
    assert!(snap.tenants.is_empty());
    assert!(snap.metrics.is_none());
    assert!(snap.error.is_none());
    assert!(snap.loading);
}
