//! Tenant store — authority for which tenant is active, which tenants
//! the principal may switch between, and cached usage metrics.
//!
//! Scope is strictly derived from the session store's resolved role:
//! platform admins see the full tenant list, everyone else sees the
//! singleton list of their own tenant. The role is looked up fresh at
//! refresh time — a role change does not retroactively re-scope an
//! already-cached list until the next explicit refresh.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use revly_core::RevlyError;
use revly_core::models::metrics::TenantMetrics;
use revly_core::models::tenant::{CreateTenant, Tenant, UpdateTenant};
use revly_core::services::{ProfileService, TenantService};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::persist::{self, StateStore, TENANT_STATE_KEY};
use crate::principal::PrincipalSource;

const TENANT_SNAPSHOT_VERSION: u32 = 1;

/// Subset of tenant state that survives process restarts.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedTenant {
    current: Option<Tenant>,
    selected_id: Option<Uuid>,
    last_fetch: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct TenantState {
    current: Option<Tenant>,
    tenants: Vec<Tenant>,
    available: Vec<Tenant>,
    metrics: Option<TenantMetrics>,
    loading: bool,
    switching: bool,
    error: Option<String>,
    initialized: bool,
    last_fetch: Option<DateTime<Utc>>,
    selected_id: Option<Uuid>,
}

impl Default for TenantState {
    fn default() -> Self {
        Self {
            current: None,
            tenants: Vec::new(),
            available: Vec::new(),
            metrics: None,
            loading: true,
            switching: false,
            error: None,
            initialized: false,
            last_fetch: None,
            selected_id: None,
        }
    }
}

/// Read model handed to consumers.
#[derive(Debug, Clone)]
pub struct TenantSnapshot {
    pub current: Option<Tenant>,
    pub tenants: Vec<Tenant>,
    pub available: Vec<Tenant>,
    pub metrics: Option<TenantMetrics>,
    pub loading: bool,
    pub switching: bool,
    pub error: Option<String>,
}

impl TenantSnapshot {
    pub fn is_tenant_active(&self) -> bool {
        self.current.as_ref().is_some_and(Tenant::is_active)
    }

    pub fn has_tenant(&self) -> bool {
        self.current.is_some()
    }
}

/// Tenant store.
///
/// Generic over the principal seam, the tenant/profile services, and
/// the persistence backend.
pub struct TenantStore<S, T, P, K>
where
    S: PrincipalSource,
    T: TenantService,
    P: ProfileService,
    K: StateStore,
{
    principal: Arc<S>,
    tenants: T,
    profiles: P,
    state_store: K,
    config: StoreConfig,
    state: Mutex<TenantState>,
}

impl<S, T, P, K> TenantStore<S, T, P, K>
where
    S: PrincipalSource,
    T: TenantService,
    P: ProfileService,
    K: StateStore,
{
    pub fn new(
        principal: Arc<S>,
        tenants: T,
        profiles: P,
        state_store: K,
        config: StoreConfig,
    ) -> Self {
        Self {
            principal,
            tenants,
            profiles,
            state_store,
            config,
            state: Mutex::new(TenantState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, TenantState> {
        // A poisoned lock only means a panic happened mid-update; the
        // state itself is still structurally valid.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> TenantSnapshot {
        let st = self.state();
        TenantSnapshot {
            current: st.current.clone(),
            tenants: st.tenants.clone(),
            available: st.available.clone(),
            metrics: st.metrics.clone(),
            loading: st.loading,
            switching: st.switching,
            error: st.error.clone(),
        }
    }

    /// Whether the cached tenant list is still inside the validity
    /// window.
    pub fn is_cache_valid(&self) -> bool {
        self.cache_valid_at(self.state().last_fetch)
    }

    fn cache_valid_at(&self, last_fetch: Option<DateTime<Utc>>) -> bool {
        let Some(last_fetch) = last_fetch else {
            return false;
        };
        Utc::now() - last_fetch < Duration::seconds(self.config.tenant_cache_ttl_secs as i64)
    }

    /// Rehydrate persisted state and refresh unless the cache is still
    /// valid. Idempotent under the initialized guard, like the session
    /// store's initializer.
    pub async fn initialize(&self) {
        {
            let mut st = self.state();
            if st.initialized {
                return;
            }
            st.initialized = true;
            st.loading = true;
        }

        // Synchronous local-state read.
        let persisted: Option<PersistedTenant> =
            persist::load_versioned(&self.state_store, TENANT_STATE_KEY, TENANT_SNAPSHOT_VERSION);

        if let Some(p) = persisted {
            let mut st = self.state();
            st.current = p.current;
            st.selected_id = p.selected_id;
            st.last_fetch = p.last_fetch;
            if let Some(current) = st.current.clone() {
                st.tenants = vec![current.clone()];
                st.available = vec![current];
            }
        }

        let cache_ok = {
            let st = self.state();
            st.current.is_some() && self.cache_valid_at(st.last_fetch)
        };

        if cache_ok {
            debug!("tenant cache still valid; skipping refresh");
            self.state().loading = false;
            return;
        }

        self.refresh_tenants().await;
    }

    /// Re-derive tenant scope for the current principal.
    ///
    /// The resolved role is looked up fresh at call time. "Not
    /// assigned to any tenant" is a valid empty state, not a failure;
    /// remote errors leave previously cached tenants untouched.
    pub async fn refresh_tenants(&self) {
        {
            let mut st = self.state();
            st.loading = true;
            st.error = None;
        }

        let Some(user_id) = self.principal.current_user_id() else {
            // No signed-in principal: nothing to scope by.
            self.clear_tenant_state();
            return;
        };

        let profile = match self.profiles.fetch(user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                self.clear_tenant_state();
                return;
            }
            Err(e) => {
                self.record_failure("profile lookup", e);
                return;
            }
        };

        let current = match self.tenants.current_for(user_id).await {
            Ok(current) => current,
            Err(e) => {
                self.record_failure("tenant fetch", e);
                return;
            }
        };

        if profile.role.is_super_admin() {
            let all = match self.tenants.list_all().await {
                Ok(all) => all,
                Err(e) => {
                    self.record_failure("tenant list fetch", e);
                    return;
                }
            };

            let mut st = self.state();
            // Keep an explicitly selected tenant if it is still
            // visible in the fresh list.
            let selected = st
                .selected_id
                .and_then(|id| all.iter().find(|t| t.id == id).cloned());
            st.current = selected.or(current);
            st.tenants = all.clone();
            st.available = all;
            st.selected_id = st.current.as_ref().map(|t| t.id);
            st.last_fetch = Some(Utc::now());
            st.loading = false;
            info!(tenants = st.tenants.len(), "tenant list refreshed (platform admin)");
            self.persist_state(&st);
        } else {
            match current {
                Some(tenant) => {
                    let mut st = self.state();
                    st.current = Some(tenant.clone());
                    st.tenants = vec![tenant.clone()];
                    st.available = vec![tenant];
                    st.selected_id = st.current.as_ref().map(|t| t.id);
                    st.last_fetch = Some(Utc::now());
                    st.loading = false;
                    self.persist_state(&st);
                }
                None => {
                    // Valid "no tenant assigned" state.
                    info!(user_id = %user_id, "principal has no tenant assignment");
                    self.clear_tenant_state();
                }
            }
        }
    }

    /// Switch among already-cached tenants.
    ///
    /// Deliberately no remote lookup: a target missing from the cache
    /// is an error, and callers must `refresh_tenants()` first if the
    /// tenant is not yet visible. The failure never mutates
    /// `current`.
    pub async fn switch_tenant(&self, tenant_id: Uuid) -> Result<(), StoreError> {
        let target = {
            let st = self.state();
            st.tenants.iter().find(|t| t.id == tenant_id).cloned()
        };
        let Some(target) = target else {
            return Err(StoreError::TenantNotFound { id: tenant_id });
        };

        {
            let mut st = self.state();
            st.switching = true;
            st.current = Some(target);
            st.selected_id = Some(tenant_id);
            // Metrics are scoped to exactly one tenant; the old
            // snapshot is meaningless for the new one.
            st.metrics = None;
            self.persist_state(&st);
        }

        self.refresh_metrics().await;

        self.state().switching = false;
        info!(tenant_id = %tenant_id, "switched tenant");
        Ok(())
    }

    /// Create a tenant remotely and append it to the cached lists.
    pub async fn create_tenant(&self, input: CreateTenant) -> Result<Tenant, StoreError> {
        let created = self.tenants.create(input).await.map_err(StoreError::from)?;

        let mut st = self.state();
        st.tenants.push(created.clone());
        st.available.push(created.clone());
        info!(tenant_id = %created.id, "tenant created");
        Ok(created)
    }

    /// Update a tenant remotely, then patch every cached copy through
    /// the shared reducer — no re-fetch round-trip. A failed mutation
    /// leaves the caches untouched.
    pub async fn update_tenant(
        &self,
        id: Uuid,
        input: UpdateTenant,
    ) -> Result<Tenant, StoreError> {
        let updated = self
            .tenants
            .update(id, input)
            .await
            .map_err(StoreError::from)?;

        let mut st = self.state();
        apply_tenant_patch(&mut st, &updated);
        if st.current.as_ref().is_some_and(|c| c.id == id) {
            self.persist_state(&st);
        }
        Ok(updated)
    }

    /// Delete a tenant remotely and drop it from the cached lists.
    pub async fn delete_tenant(&self, id: Uuid) -> Result<(), StoreError> {
        self.tenants.delete(id).await.map_err(StoreError::from)?;

        let mut st = self.state();
        st.tenants.retain(|t| t.id != id);
        st.available.retain(|t| t.id != id);
        if st.current.as_ref().is_some_and(|c| c.id == id) {
            st.current = None;
            st.metrics = None;
            st.selected_id = None;
            self.persist_state(&st);
        }
        info!(tenant_id = %id, "tenant deleted");
        Ok(())
    }

    /// Replace the metrics snapshot for the active tenant. No-ops
    /// without one; a failed fetch records the error and leaves the
    /// previous snapshot in place.
    pub async fn refresh_metrics(&self) {
        let tenant_id = {
            let st = self.state();
            st.current.as_ref().map(|t| t.id)
        };
        let Some(tenant_id) = tenant_id else {
            return;
        };

        match self.tenants.metrics(tenant_id).await {
            Ok(metrics) => {
                let mut st = self.state();
                // Wholesale replacement only — metrics are a
                // point-in-time snapshot, never merged.
                if st.current.as_ref().is_some_and(|t| t.id == tenant_id) {
                    st.metrics = Some(metrics);
                }
            }
            Err(e) => {
                warn!(tenant_id = %tenant_id, error = %e, "metrics refresh failed");
                self.state().error = Some(e.to_string());
            }
        }
    }

    /// Back to Uninitialized-equivalent defaults. Used on sign-out.
    pub fn reset(&self) {
        *self.state() = TenantState::default();
        if let Err(e) = self.state_store.remove(TENANT_STATE_KEY) {
            warn!(error = %e, "failed to clear persisted tenant state");
        }
    }

    fn clear_tenant_state(&self) {
        let mut st = self.state();
        st.current = None;
        st.tenants.clear();
        st.available.clear();
        st.metrics = None;
        st.selected_id = None;
        st.last_fetch = Some(Utc::now());
        st.loading = false;
        st.error = None;
        self.persist_state(&st);
    }

    fn record_failure(&self, what: &str, e: RevlyError) {
        error!(error = %e, "{what} failed");
        let mut st = self.state();
        st.error = Some(e.to_string());
        st.loading = false;
    }

    fn persist_state(&self, st: &TenantState) {
        let snapshot = PersistedTenant {
            current: st.current.clone(),
            selected_id: st.selected_id,
            last_fetch: st.last_fetch,
        };
        persist::save_versioned(
            &self.state_store,
            TENANT_STATE_KEY,
            TENANT_SNAPSHOT_VERSION,
            &snapshot,
        );
    }
}

/// Fold a mutated tenant into every cached copy. Single place shared
/// by the patch paths so they cannot diverge from each other.
fn apply_tenant_patch(st: &mut TenantState, updated: &Tenant) {
    patch_list(&mut st.tenants, updated);
    patch_list(&mut st.available, updated);
    if st.current.as_ref().is_some_and(|c| c.id == updated.id) {
        st.current = Some(updated.clone());
    }
}

fn patch_list(list: &mut [Tenant], updated: &Tenant) {
    if let Some(slot) = list.iter_mut().find(|t| t.id == updated.id) {
        *slot = updated.clone();
    }
}
