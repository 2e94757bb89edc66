//! Integration tests for the HTTP service implementations against a
//! mock backend server.

use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use revly_core::RevlyError;
use revly_core::models::role::Role;
use revly_core::models::tenant::{TenantStatus, UpdateTenant};
use revly_core::services::{IdentityService, ProfileService, TenantService};
use revly_remote::{
    HttpIdentityService, HttpProfileService, HttpTenantService, RemoteClient, RemoteConfig,
};

async fn client_for(server: &MockServer) -> RemoteClient {
    RemoteClient::new(&RemoteConfig {
        base_url: server.uri(),
        api_key: "test-key".into(),
        timeout_secs: 5,
    })
    .unwrap()
}

fn user_json(id: Uuid, email: &str) -> serde_json::Value {
    json!({
        "id": id,
        "email": email,
        "email_confirmed_at": "2026-01-10T09:00:00Z",
        "created_at": "2026-01-01T00:00:00Z",
        "last_sign_in_at": null,
    })
}

fn tenant_json(id: Uuid, name: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "domain": null,
        "status": status,
        "plan": "starter",
        "settings": {
            "public_form_enabled": true,
            "export_enabled": false,
            "max_users": 5,
            "max_reviews_per_month": 500,
            "welcome_message": null,
        },
        "created_at": "2026-01-01T00:00:00Z",
        "updated_at": "2026-01-02T00:00:00Z",
        "created_by": null,
    })
}

#[tokio::test]
async fn sign_in_returns_user_and_session() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-123",
            "refresh_token": "rt-456",
            "expires_in": 3600,
            "user": user_json(user_id, "alice@example.com"),
        })))
        .mount(&server)
        .await;

    let identity = HttpIdentityService::new(client_for(&server).await);
    let authed = identity
        .sign_in("alice@example.com", "correct-horse")
        .await
        .unwrap();

    assert_eq!(authed.user.id, user_id);
    assert_eq!(authed.session.access_token, "at-123");
    assert!(authed.session.expires_at > chrono::Utc::now());
    assert!(authed.user.is_email_verified());
}

#[tokio::test]
async fn rejected_credentials_surface_as_authentication_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("invalid login credentials"),
        )
        .mount(&server)
        .await;

    let identity = HttpIdentityService::new(client_for(&server).await);
    let err = identity
        .sign_in("alice@example.com", "wrong")
        .await
        .unwrap_err();

    assert!(matches!(err, RevlyError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn invalid_token_means_no_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/session"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;

    let identity = HttpIdentityService::new(client_for(&server).await);
    let session = identity.get_session("stale-token").await.unwrap();
    assert!(session.is_none());
}

#[tokio::test]
async fn profile_fetch_maps_rows_and_absence() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    let missing_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", format!("eq.{user_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": user_id,
            "email": "lead@example.com",
            "full_name": "Lena Ortiz",
            "role": "tenant_admin",
            "tenant_id": null,
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-02T00:00:00Z",
        }])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", format!("eq.{missing_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let profiles = HttpProfileService::new(client_for(&server).await);

    let profile = profiles.fetch(user_id).await.unwrap().unwrap();
    assert_eq!(profile.role, Role::TenantAdmin);
    assert_eq!(profile.full_name.as_deref(), Some("Lena Ortiz"));

    let missing = profiles.fetch(missing_id).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn current_tenant_rpc_null_is_a_valid_empty_state() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/current_tenant"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
        .mount(&server)
        .await;

    let tenants = HttpTenantService::new(client_for(&server).await);
    let current = tenants.current_for(Uuid::new_v4()).await.unwrap();
    assert!(current.is_none());
}

#[tokio::test]
async fn tenant_list_and_update_round_trip() {
    let server = MockServer::start().await;
    let t1 = Uuid::new_v4();
    let t2 = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/tenants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            tenant_json(t1, "Acme Reviews", "active"),
            tenant_json(t2, "Globex Feedback", "pending"),
        ])))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/tenants"))
        .and(query_param("id", format!("eq.{t1}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([tenant_json(t1, "Acme Reviews", "suspended")])),
        )
        .mount(&server)
        .await;

    let tenants = HttpTenantService::new(client_for(&server).await);

    let all = tenants.list_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].status, TenantStatus::Active);

    let updated = tenants
        .update(
            t1,
            UpdateTenant {
                status: Some(TenantStatus::Suspended),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, TenantStatus::Suspended);
}

#[tokio::test]
async fn fetch_by_id_maps_an_empty_result_to_not_found() {
    let server = MockServer::start().await;
    let tenant_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/tenants"))
        .and(query_param("id", format!("eq.{tenant_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let tenants = HttpTenantService::new(client_for(&server).await);
    let err = tenants.get(tenant_id).await.unwrap_err();
    assert!(matches!(err, RevlyError::NotFound { .. }));
}

#[tokio::test]
async fn metrics_rpc_decodes_the_snapshot() {
    let server = MockServer::start().await;
    let tenant_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/tenant_metrics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tenant_id": tenant_id,
            "user_count": 12,
            "review_count": 340,
            "active_users": 7,
            "storage_bytes": 52428800u64,
            "api_calls": 1923,
            "last_activity_at": "2026-02-01T12:00:00Z",
        })))
        .mount(&server)
        .await;

    let tenants = HttpTenantService::new(client_for(&server).await);
    let metrics = tenants.metrics(tenant_id).await.unwrap();
    assert_eq!(metrics.tenant_id, tenant_id);
    assert_eq!(metrics.review_count, 340);
    assert!(metrics.last_activity_at.is_some());
}

#[tokio::test]
async fn delete_succeeds_on_no_content() {
    let server = MockServer::start().await;
    let tenant_id = Uuid::new_v4();

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/tenants"))
        .and(query_param("id", format!("eq.{tenant_id}")))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let tenants = HttpTenantService::new(client_for(&server).await);
    tenants.delete(tenant_id).await.unwrap();
}

#[tokio::test]
async fn server_errors_map_to_remote_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/tenants"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let tenants = HttpTenantService::new(client_for(&server).await);
    let err = tenants.list_all().await.unwrap_err();
    assert!(matches!(err, RevlyError::Remote(_)));
}
