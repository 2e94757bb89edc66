//! Session store — single authority for who the current principal is
//! and whether they hold a live session.
//!
//! State machine: Uninitialized → Initializing → Authenticated /
//! Unauthenticated. Remote failures never escape as panics; every
//! public action either returns a [`StoreError`] or resolves void
//! while recording the store-level error string. `loading` always
//! settles to `false` once an operation settles.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use revly_core::RevlyError;
use revly_core::models::profile::{Profile, UpdateProfile};
use revly_core::models::role::Role;
use revly_core::models::session::Session;
use revly_core::models::user::{SignUpAttrs, User};
use revly_core::services::{IdentityService, ProfileService};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::freshness::Freshness;
use crate::persist::{self, SESSION_STATE_KEY, StateStore};
use crate::principal::PrincipalSource;

const SESSION_SNAPSHOT_VERSION: u32 = 1;

/// Subset of session state that survives process restarts.
///
/// Non-persisted fields (`loading`, expiry bookkeeping) start from
/// fresh defaults on rehydration.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    user: Option<User>,
    session: Option<Session>,
    profile: Option<Profile>,
    /// Tenant reference from the profile, kept so dependent stores can
    /// rehydrate scope before the first profile fetch completes.
    tenant_id: Option<Uuid>,
    last_activity: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct SessionState {
    user: Option<User>,
    session: Option<Session>,
    profile: Freshness<Profile>,
    loading: bool,
    error: Option<String>,
    initialized: bool,
    last_activity: DateTime<Utc>,
    expiring_soon: bool,
    time_until_expiry: Option<Duration>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            session: None,
            profile: Freshness::Absent,
            loading: true,
            error: None,
            initialized: false,
            last_activity: Utc::now(),
            expiring_soon: false,
            time_until_expiry: None,
        }
    }
}

/// Read model handed to consumers. Derived flags are computed from the
/// snapshot, never stored, so they cannot drift from the state they
/// derive from.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub session: Option<Session>,
    pub profile: Freshness<Profile>,
    pub loading: bool,
    pub error: Option<String>,
    pub expiring_soon: bool,
    pub time_until_expiry: Option<Duration>,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_email_verified(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_email_verified)
    }

    pub fn role(&self) -> Option<Role> {
        self.profile.value().map(|p| p.role)
    }

    pub fn has_role(&self, required: Role) -> bool {
        self.role().is_some_and(|r| r.satisfies(required))
    }
}

/// Session store.
///
/// Generic over the identity/profile services and the persistence
/// backend so the store has no dependency on the transport crate.
pub struct SessionStore<I: IdentityService, P: ProfileService, K: StateStore> {
    identity: I,
    profiles: P,
    state_store: K,
    config: StoreConfig,
    state: Mutex<SessionState>,
}

impl<I: IdentityService, P: ProfileService, K: StateStore> SessionStore<I, P, K> {
    pub fn new(identity: I, profiles: P, state_store: K, config: StoreConfig) -> Self {
        Self {
            identity,
            profiles,
            state_store,
            config,
            state: Mutex::new(SessionState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        // A poisoned lock only means a panic happened mid-update; the
        // state itself is still structurally valid.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let st = self.state();
        SessionSnapshot {
            user: st.user.clone(),
            session: st.session.clone(),
            profile: st.profile.clone(),
            loading: st.loading,
            error: st.error.clone(),
            expiring_soon: st.expiring_soon,
            time_until_expiry: st.time_until_expiry,
        }
    }

    /// Resolve an existing session from persisted state and the remote
    /// identity service.
    ///
    /// Idempotent under the initialized guard: a second call that
    /// observes the guard returns without touching the remote service.
    /// The guard is a flag, not a mutex — duplicate concurrent calls
    /// are tolerated, not prevented.
    pub async fn initialize(&self) {
        {
            let mut st = self.state();
            if st.initialized {
                return;
            }
            st.initialized = true;
            st.loading = true;
        }

        // Synchronous local-state read — the one non-suspending step.
        let persisted: Option<PersistedSession> =
            persist::load_versioned(&self.state_store, SESSION_STATE_KEY, SESSION_SNAPSHOT_VERSION);

        let timeout = Duration::seconds(self.config.session_timeout_secs as i64);
        let persisted = persisted.filter(|p| {
            let idle = Utc::now() - p.last_activity;
            if idle > timeout {
                warn!(idle_secs = idle.num_seconds(), "discarding persisted session after inactivity");
                false
            } else {
                true
            }
        });

        let access_token = persisted
            .as_ref()
            .and_then(|p| p.session.as_ref())
            .map(|s| s.access_token.clone());

        if let Some(p) = persisted {
            let mut st = self.state();
            st.user = p.user;
            st.session = p.session;
            // Rehydrated values are last-known, not fresh.
            st.profile = p.profile.map(Freshness::Stale).unwrap_or_default();
            st.last_activity = p.last_activity;
        }

        let Some(token) = access_token else {
            // No usable persisted session: Unauthenticated.
            let mut st = self.state();
            st.user = None;
            st.session = None;
            st.profile = Freshness::Absent;
            st.loading = false;
            return;
        };

        match self.identity.get_session(&token).await {
            Ok(Some(authed)) => {
                {
                    let mut st = self.state();
                    st.user = Some(authed.user);
                    st.session = Some(authed.session);
                    st.last_activity = Utc::now();
                    self.recompute_expiry(&mut st);
                }
                self.refresh_profile().await;
                let mut st = self.state();
                st.loading = false;
                self.persist_state(&st);
                info!("session restored");
            }
            Ok(None) => {
                self.clear_identity_state();
                info!("no live session found");
            }
            Err(e) => {
                warn!(error = %e, "session check failed during initialization");
                self.clear_identity_state();
                self.state().error = Some(e.to_string());
            }
        }
    }

    /// Exchange credentials for an authenticated session.
    ///
    /// On success the profile refresh completes before this resolves,
    /// so callers observe either a populated profile or an explicitly
    /// absent one — never a stale one from a previous principal.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), StoreError> {
        {
            let mut st = self.state();
            st.loading = true;
            st.error = None;
        }

        let authed = match self.identity.sign_in(email, password).await {
            Ok(authed) => authed,
            Err(e) => {
                // Sign-in failure is recorded both inline and on the
                // store so role-gated UI and the form both see it.
                let mut st = self.state();
                st.loading = false;
                st.error = Some(e.to_string());
                return Err(match e {
                    RevlyError::AuthenticationFailed { .. } => StoreError::InvalidCredentials,
                    other => StoreError::Remote(other.to_string()),
                });
            }
        };

        {
            let mut st = self.state();
            st.user = Some(authed.user);
            st.session = Some(authed.session);
            st.profile = Freshness::Absent;
            st.last_activity = Utc::now();
            self.recompute_expiry(&mut st);
        }

        self.refresh_profile().await;

        let mut st = self.state();
        st.loading = false;
        self.persist_state(&st);
        if let Some(user) = &st.user {
            info!(user_id = %user.id, "signed in");
        }
        Ok(())
    }

    /// Create a remote account. Does not sign the new user in.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        attrs: SignUpAttrs,
    ) -> Result<User, StoreError> {
        let user = self
            .identity
            .sign_up(email, password, attrs)
            .await
            .map_err(StoreError::from)?;
        info!(user_id = %user.id, "account created");
        Ok(user)
    }

    /// Sign out. Remote invalidation is best-effort; the local reset is
    /// unconditional so the UI can never stay in a stale authenticated
    /// state.
    pub async fn sign_out(&self) {
        let token = {
            let st = self.state();
            st.session.as_ref().map(|s| s.access_token.clone())
        };

        if let Some(token) = token {
            if let Err(e) = self.identity.sign_out(&token).await {
                warn!(error = %e, "remote sign-out failed; clearing local state anyway");
            }
        }

        {
            let mut st = self.state();
            st.user = None;
            st.session = None;
            st.profile = Freshness::Absent;
            st.error = None;
            st.loading = false;
            st.expiring_soon = false;
            st.time_until_expiry = None;
            st.last_activity = Utc::now();
        }

        if let Err(e) = self.state_store.remove(SESSION_STATE_KEY) {
            warn!(error = %e, "failed to clear persisted session");
        }
        info!("signed out");
    }

    /// Local-only reset back to Uninitialized defaults. Used by the
    /// composition layer; does not call the remote service.
    pub fn reset(&self) {
        *self.state() = SessionState::default();
        if let Err(e) = self.state_store.remove(SESSION_STATE_KEY) {
            warn!(error = %e, "failed to clear persisted session");
        }
    }

    /// Re-fetch the profile for the current user.
    ///
    /// No-ops silently without a user. A fetch error demotes the held
    /// profile to stale rather than clearing it, so transient network
    /// failures don't kick users out of role-gated UI.
    pub async fn refresh_profile(&self) {
        let user_id = {
            let st = self.state();
            st.user.as_ref().map(|u| u.id)
        };
        let Some(user_id) = user_id else {
            return;
        };

        match self.profiles.fetch(user_id).await {
            Ok(Some(profile)) => {
                let mut st = self.state();
                st.profile = Freshness::Fresh(profile);
                self.persist_state(&st);
            }
            Ok(None) => {
                let mut st = self.state();
                st.profile = Freshness::Absent;
                self.persist_state(&st);
            }
            Err(e) => {
                warn!(error = %e, "profile refresh failed; keeping last known profile");
                let mut st = self.state();
                let prior = std::mem::take(&mut st.profile);
                st.profile = prior.into_stale();
            }
        }
    }

    /// Partially update the profile, then re-fetch the full record —
    /// the partial payload is never trusted as the new truth.
    pub async fn update_profile(&self, updates: UpdateProfile) -> Result<(), StoreError> {
        let user_id = {
            let st = self.state();
            st.user.as_ref().map(|u| u.id)
        };
        let Some(user_id) = user_id else {
            return Err(StoreError::NoUser);
        };

        self.profiles
            .update(user_id, updates)
            .await
            .map_err(StoreError::from)?;

        self.refresh_profile().await;
        Ok(())
    }

    /// Exchange the refresh token for a fresh session, updating
    /// user/session in place. Profile and dependent stores are not
    /// reset. A failed refresh records the error and leaves the
    /// current state intact — a network blip must not sign the user
    /// out.
    pub async fn refresh_session(&self) {
        let refresh_token = {
            let st = self.state();
            st.session.as_ref().map(|s| s.refresh_token.clone())
        };
        let Some(refresh_token) = refresh_token else {
            return;
        };

        match self.identity.refresh_session(&refresh_token).await {
            Ok(authed) => {
                let mut st = self.state();
                st.user = Some(authed.user);
                st.session = Some(authed.session);
                st.last_activity = Utc::now();
                self.recompute_expiry(&mut st);
                self.persist_state(&st);
                info!("session refreshed");
            }
            Err(e) => {
                warn!(error = %e, "session refresh failed");
                self.state().error = Some(e.to_string());
            }
        }
    }

    /// Re-validate the current session against the remote service.
    /// Updates user/session in place; only a check that yields no
    /// session clears local identity state.
    pub async fn check_session(&self) {
        let access_token = {
            let st = self.state();
            st.session.as_ref().map(|s| s.access_token.clone())
        };
        let Some(access_token) = access_token else {
            return;
        };

        match self.identity.get_session(&access_token).await {
            Ok(Some(authed)) => {
                let mut st = self.state();
                st.user = Some(authed.user);
                st.session = Some(authed.session);
                st.last_activity = Utc::now();
                self.recompute_expiry(&mut st);
                self.persist_state(&st);
            }
            Ok(None) => {
                info!("session no longer valid");
                self.clear_identity_state();
            }
            Err(e) => {
                warn!(error = %e, "session check failed");
                self.state().error = Some(e.to_string());
            }
        }
    }

    /// Expiry bookkeeping is recomputed here, from the session's
    /// expiry timestamp, by every session-affecting operation. The
    /// store runs no timer of its own.
    fn recompute_expiry(&self, st: &mut SessionState) {
        match &st.session {
            Some(session) => {
                let remaining = session.expires_at - Utc::now();
                st.expiring_soon =
                    remaining <= Duration::seconds(self.config.expiry_warning_secs as i64);
                st.time_until_expiry = Some(remaining.max(Duration::zero()));
            }
            None => {
                st.expiring_soon = false;
                st.time_until_expiry = None;
            }
        }
    }

    fn clear_identity_state(&self) {
        let mut st = self.state();
        st.user = None;
        st.session = None;
        st.profile = Freshness::Absent;
        st.loading = false;
        st.expiring_soon = false;
        st.time_until_expiry = None;
        drop(st);

        if let Err(e) = self.state_store.remove(SESSION_STATE_KEY) {
            warn!(error = %e, "failed to clear persisted session");
        }
    }

    fn persist_state(&self, st: &SessionState) {
        let snapshot = PersistedSession {
            user: st.user.clone(),
            session: st.session.clone(),
            profile: st.profile.value().cloned(),
            tenant_id: st.profile.value().and_then(|p| p.tenant_id),
            last_activity: st.last_activity,
        };
        persist::save_versioned(
            &self.state_store,
            SESSION_STATE_KEY,
            SESSION_SNAPSHOT_VERSION,
            &snapshot,
        );
    }
}

impl<I: IdentityService, P: ProfileService, K: StateStore> PrincipalSource
    for SessionStore<I, P, K>
{
    fn current_user_id(&self) -> Option<Uuid> {
        self.state().user.as_ref().map(|u| u.id)
    }
}
