//! Composition layer — one read model over both stores.
//!
//! The composition root owns both stores and hands out a unified
//! snapshot plus the two compound operations: joint initialization
//! and joint reset. No ambient singletons; everything is constructed
//! here and passed down explicitly.

use std::sync::Arc;

use revly_core::models::role::Role;
use revly_core::services::{IdentityService, ProfileService, TenantService};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::persist::StateStore;
use crate::session::{SessionSnapshot, SessionStore};
use crate::tenant::{TenantSnapshot, TenantStore};

/// Unified read model combining both stores' snapshots.
#[derive(Debug, Clone)]
pub struct AppSnapshot {
    pub session: SessionSnapshot,
    pub tenant: TenantSnapshot,
}

impl AppSnapshot {
    /// Logical OR of both stores' loading flags.
    pub fn loading(&self) -> bool {
        self.session.loading || self.tenant.loading
    }

    /// First non-null of the two stores' errors.
    pub fn error(&self) -> Option<&str> {
        self.session
            .error
            .as_deref()
            .or(self.tenant.error.as_deref())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn is_tenant_active(&self) -> bool {
        self.tenant.is_tenant_active()
    }

    /// Role gate for protected UI.
    pub fn can_access(&self, required: Role) -> bool {
        self.session.has_role(required)
    }
}

/// Composition root over the session and tenant stores.
pub struct AppStore<I, P, T, K>
where
    I: IdentityService,
    P: ProfileService,
    T: TenantService,
    K: StateStore,
{
    session: Arc<SessionStore<I, P, K>>,
    tenant: Arc<TenantStore<SessionStore<I, P, K>, T, P, K>>,
}

impl<I, P, T, K> AppStore<I, P, T, K>
where
    I: IdentityService,
    P: ProfileService + Clone,
    T: TenantService,
    K: StateStore + Clone,
{
    pub fn new(
        identity: I,
        profiles: P,
        tenants: T,
        state_store: K,
        config: StoreConfig,
    ) -> Self {
        let session = Arc::new(SessionStore::new(
            identity,
            profiles.clone(),
            state_store.clone(),
            config.clone(),
        ));
        let tenant = Arc::new(TenantStore::new(
            session.clone(),
            tenants,
            profiles,
            state_store,
            config,
        ));
        Self { session, tenant }
    }

    pub fn session(&self) -> &Arc<SessionStore<I, P, K>> {
        &self.session
    }

    pub fn tenant(&self) -> &Arc<TenantStore<SessionStore<I, P, K>, T, P, K>> {
        &self.tenant
    }

    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            session: self.session.snapshot(),
            tenant: self.tenant.snapshot(),
        }
    }

    /// One-shot application initializer.
    ///
    /// Both stores initialize concurrently: the tenant store no-ops
    /// internally when no principal is resolved yet, so the join is
    /// safe regardless of which side wins the race.
    pub async fn initialize(&self) {
        tokio::join!(self.session.initialize(), self.tenant.initialize());
    }

    /// Sign in, then re-derive tenant scope for the new principal.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), StoreError> {
        self.session.sign_in(email, password).await?;
        self.tenant.refresh_tenants().await;
        Ok(())
    }

    /// Sign out and drop tenant scope with it.
    pub async fn sign_out(&self) {
        self.session.sign_out().await;
        self.tenant.reset();
    }

    /// Local-only reset of both stores. Order does not matter — each
    /// reset is self-contained and does not consult the other store.
    pub fn reset(&self) {
        self.session.reset();
        self.tenant.reset();
    }
}
