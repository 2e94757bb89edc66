//! In-memory backend implementing all three service traits.
//!
//! Plays the role an embedded in-memory database engine plays in a
//! server-side test suite: integration tests (and local demos) run the
//! stores against this backend instead of the hosted service. Seeding
//! helpers set up principals and tenants; call counters and failure
//! injection support exercising the stores' caching and error paths.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Duration, Utc};
use uuid::Uuid;

use revly_core::models::metrics::TenantMetrics;
use revly_core::models::profile::{Profile, UpdateProfile};
use revly_core::models::role::Role;
use revly_core::models::session::Session;
use revly_core::models::tenant::{
    CreateTenant, PlanTier, Tenant, TenantSettings, TenantStatus, UpdateTenant,
};
use revly_core::models::user::{SignUpAttrs, User};
use revly_core::services::{
    AuthedSession, IdentityService, ProfileService, TenantService,
};
use revly_core::{RevlyError, RevlyResult};

#[derive(Debug, Default)]
struct Counters {
    session_checks: usize,
    profile_fetches: usize,
    current_tenant_fetches: usize,
    tenant_list_fetches: usize,
    metrics_fetches: usize,
}

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    /// email → (user id, password)
    credentials: HashMap<String, (Uuid, String)>,
    profiles: HashMap<Uuid, Profile>,
    tenants: Vec<Tenant>,
    metrics: HashMap<Uuid, TenantMetrics>,
    /// access token → user id
    access_tokens: HashMap<String, Uuid>,
    /// refresh token → user id
    refresh_tokens: HashMap<String, Uuid>,
    offline: bool,
    fail_sign_out: bool,
    counters: Counters,
}

/// In-memory backend. Cheap to clone — clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_online(inner: &Inner) -> RevlyResult<()> {
        if inner.offline {
            Err(RevlyError::Remote("network unreachable".into()))
        } else {
            Ok(())
        }
    }

    // -- seeding -----------------------------------------------------------

    /// Register a user with credentials and a profile.
    pub fn add_user(
        &self,
        email: &str,
        password: &str,
        role: Role,
        tenant_id: Option<Uuid>,
    ) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            email_confirmed_at: Some(now),
            created_at: now,
            last_sign_in_at: None,
        };
        let profile = Profile {
            id: user.id,
            email: email.to_string(),
            full_name: None,
            role,
            tenant_id,
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.inner();
        inner
            .credentials
            .insert(email.to_string(), (user.id, password.to_string()));
        inner.profiles.insert(user.id, profile);
        inner.users.insert(user.id, user.clone());
        user
    }

    /// Register a tenant with default settings.
    pub fn add_tenant(&self, name: &str) -> Tenant {
        let now = Utc::now();
        let tenant = Tenant {
            id: Uuid::new_v4(),
            name: name.to_string(),
            domain: None,
            status: TenantStatus::Active,
            plan: PlanTier::Starter,
            settings: TenantSettings::default(),
            created_at: now,
            updated_at: now,
            created_by: None,
        };
        self.inner().tenants.push(tenant.clone());
        tenant
    }

    pub fn set_metrics(&self, metrics: TenantMetrics) {
        self.inner().metrics.insert(metrics.tenant_id, metrics);
    }

    /// Drop a profile record, leaving the user intact.
    pub fn remove_profile(&self, user_id: Uuid) {
        self.inner().profiles.remove(&user_id);
    }

    // -- failure injection -------------------------------------------------

    /// Make every subsequent call fail with a network error.
    pub fn set_offline(&self, offline: bool) {
        self.inner().offline = offline;
    }

    /// Make remote sign-out fail while everything else keeps working.
    pub fn set_fail_sign_out(&self, fail: bool) {
        self.inner().fail_sign_out = fail;
    }

    // -- call counters -----------------------------------------------------

    pub fn session_checks(&self) -> usize {
        self.inner().counters.session_checks
    }

    pub fn profile_fetches(&self) -> usize {
        self.inner().counters.profile_fetches
    }

    pub fn current_tenant_fetches(&self) -> usize {
        self.inner().counters.current_tenant_fetches
    }

    pub fn tenant_list_fetches(&self) -> usize {
        self.inner().counters.tenant_list_fetches
    }

    pub fn metrics_fetches(&self) -> usize {
        self.inner().counters.metrics_fetches
    }

    fn mint_session(inner: &mut Inner, user_id: Uuid) -> RevlyResult<AuthedSession> {
        let user = inner
            .users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| RevlyError::Internal(format!("no user record for {user_id}")))?;

        let session = Session {
            access_token: format!("access-{}", Uuid::new_v4()),
            refresh_token: format!("refresh-{}", Uuid::new_v4()),
            expires_at: Utc::now() + Duration::hours(1),
        };
        inner
            .access_tokens
            .insert(session.access_token.clone(), user_id);
        inner
            .refresh_tokens
            .insert(session.refresh_token.clone(), user_id);
        Ok(AuthedSession { user, session })
    }
}

impl IdentityService for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> RevlyResult<AuthedSession> {
        let mut inner = self.inner();
        Self::ensure_online(&inner)?;

        let user_id = match inner.credentials.get(email) {
            Some((user_id, stored)) if stored == password => *user_id,
            _ => {
                return Err(RevlyError::AuthenticationFailed {
                    reason: "invalid credentials".into(),
                });
            }
        };

        if let Some(user) = inner.users.get_mut(&user_id) {
            user.last_sign_in_at = Some(Utc::now());
        }
        Self::mint_session(&mut inner, user_id)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        attrs: SignUpAttrs,
    ) -> RevlyResult<User> {
        let mut inner = self.inner();
        Self::ensure_online(&inner)?;

        if inner.credentials.contains_key(email) {
            return Err(RevlyError::Validation {
                message: format!("account already exists for {email}"),
            });
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            // New accounts start unconfirmed.
            email_confirmed_at: None,
            created_at: now,
            last_sign_in_at: None,
        };
        let profile = Profile {
            id: user.id,
            email: email.to_string(),
            full_name: attrs.full_name,
            role: Role::User,
            tenant_id: None,
            created_at: now,
            updated_at: now,
        };

        inner
            .credentials
            .insert(email.to_string(), (user.id, password.to_string()));
        inner.profiles.insert(user.id, profile);
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn sign_out(&self, access_token: &str) -> RevlyResult<()> {
        let mut inner = self.inner();
        Self::ensure_online(&inner)?;
        if inner.fail_sign_out {
            return Err(RevlyError::Remote("sign-out rejected".into()));
        }
        inner.access_tokens.remove(access_token);
        Ok(())
    }

    async fn get_session(&self, access_token: &str) -> RevlyResult<Option<AuthedSession>> {
        let mut inner = self.inner();
        inner.counters.session_checks += 1;
        Self::ensure_online(&inner)?;

        let Some(user_id) = inner.access_tokens.get(access_token).copied() else {
            return Ok(None);
        };
        let Some(user) = inner.users.get(&user_id).cloned() else {
            return Ok(None);
        };

        // The existing token stays valid; the check just re-derives
        // the expiry the backend has on record.
        let session = Session {
            access_token: access_token.to_string(),
            refresh_token: inner
                .refresh_tokens
                .iter()
                .find(|(_, uid)| **uid == user_id)
                .map(|(token, _)| token.clone())
                .unwrap_or_default(),
            expires_at: Utc::now() + Duration::hours(1),
        };
        Ok(Some(AuthedSession { user, session }))
    }

    async fn refresh_session(&self, refresh_token: &str) -> RevlyResult<AuthedSession> {
        let mut inner = self.inner();
        Self::ensure_online(&inner)?;

        let Some(user_id) = inner.refresh_tokens.remove(refresh_token) else {
            return Err(RevlyError::AuthenticationFailed {
                reason: "refresh token not found or already used".into(),
            });
        };
        Self::mint_session(&mut inner, user_id)
    }
}

impl ProfileService for MemoryBackend {
    async fn fetch(&self, user_id: Uuid) -> RevlyResult<Option<Profile>> {
        let mut inner = self.inner();
        inner.counters.profile_fetches += 1;
        Self::ensure_online(&inner)?;
        Ok(inner.profiles.get(&user_id).cloned())
    }

    async fn update(&self, user_id: Uuid, input: UpdateProfile) -> RevlyResult<Profile> {
        let mut inner = self.inner();
        Self::ensure_online(&inner)?;

        let profile = inner
            .profiles
            .get_mut(&user_id)
            .ok_or_else(|| RevlyError::NotFound {
                entity: "profile".into(),
                id: user_id.to_string(),
            })?;

        if let Some(email) = input.email {
            profile.email = email;
        }
        if let Some(full_name) = input.full_name {
            profile.full_name = full_name;
        }
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }
}

impl TenantService for MemoryBackend {
    async fn current_for(&self, user_id: Uuid) -> RevlyResult<Option<Tenant>> {
        let mut inner = self.inner();
        inner.counters.current_tenant_fetches += 1;
        Self::ensure_online(&inner)?;

        let Some(tenant_id) = inner.profiles.get(&user_id).and_then(|p| p.tenant_id) else {
            return Ok(None);
        };
        Ok(inner.tenants.iter().find(|t| t.id == tenant_id).cloned())
    }

    async fn list_all(&self) -> RevlyResult<Vec<Tenant>> {
        let mut inner = self.inner();
        inner.counters.tenant_list_fetches += 1;
        Self::ensure_online(&inner)?;
        Ok(inner.tenants.clone())
    }

    async fn get(&self, id: Uuid) -> RevlyResult<Tenant> {
        let inner = self.inner();
        Self::ensure_online(&inner)?;
        inner
            .tenants
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| RevlyError::NotFound {
                entity: "tenant".into(),
                id: id.to_string(),
            })
    }

    async fn metrics(&self, tenant_id: Uuid) -> RevlyResult<TenantMetrics> {
        let mut inner = self.inner();
        inner.counters.metrics_fetches += 1;
        Self::ensure_online(&inner)?;

        if let Some(metrics) = inner.metrics.get(&tenant_id) {
            return Ok(metrics.clone());
        }
        if inner.tenants.iter().any(|t| t.id == tenant_id) {
            // A tenant with no recorded activity yet.
            return Ok(TenantMetrics {
                tenant_id,
                user_count: 0,
                review_count: 0,
                active_users: 0,
                storage_bytes: 0,
                api_calls: 0,
                last_activity_at: None,
            });
        }
        Err(RevlyError::NotFound {
            entity: "tenant".into(),
            id: tenant_id.to_string(),
        })
    }

    async fn create(&self, input: CreateTenant) -> RevlyResult<Tenant> {
        let mut inner = self.inner();
        Self::ensure_online(&inner)?;

        let now = Utc::now();
        let tenant = Tenant {
            id: Uuid::new_v4(),
            name: input.name,
            domain: input.domain,
            status: TenantStatus::Pending,
            plan: input.plan,
            settings: input.settings.unwrap_or_default(),
            created_at: now,
            updated_at: now,
            created_by: None,
        };
        inner.tenants.push(tenant.clone());
        Ok(tenant)
    }

    async fn update(&self, id: Uuid, input: UpdateTenant) -> RevlyResult<Tenant> {
        let mut inner = self.inner();
        Self::ensure_online(&inner)?;

        let tenant = inner
            .tenants
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| RevlyError::NotFound {
                entity: "tenant".into(),
                id: id.to_string(),
            })?;

        if let Some(name) = input.name {
            tenant.name = name;
        }
        if let Some(domain) = input.domain {
            tenant.domain = domain;
        }
        if let Some(status) = input.status {
            tenant.status = status;
        }
        if let Some(plan) = input.plan {
            tenant.plan = plan;
        }
        if let Some(settings) = input.settings {
            tenant.settings = settings;
        }
        tenant.updated_at = Utc::now();
        Ok(tenant.clone())
    }

    async fn delete(&self, id: Uuid) -> RevlyResult<()> {
        let mut inner = self.inner();
        Self::ensure_online(&inner)?;
        inner.tenants.retain(|t| t.id != id);
        Ok(())
    }
}
