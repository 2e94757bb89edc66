//! Remote service contracts consumed by the state stores.
//!
//! All operations are async and go to the hosted backend. The stores
//! depend only on these traits; concrete implementations (HTTP and
//! in-memory) live in `revly-remote`.

use uuid::Uuid;

use crate::error::RevlyResult;
use crate::models::{
    metrics::TenantMetrics,
    profile::{Profile, UpdateProfile},
    session::Session,
    tenant::{CreateTenant, Tenant, UpdateTenant},
    user::{SignUpAttrs, User},
};

/// A user/session pair returned by authentication operations.
///
/// The two are always produced together — a session never exists
/// without the principal it belongs to.
#[derive(Debug, Clone)]
pub struct AuthedSession {
    pub user: User,
    pub session: Session,
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

pub trait IdentityService: Send + Sync {
    /// Exchange credentials for a session.
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = RevlyResult<AuthedSession>> + Send;

    /// Create a remote account. Does not sign the new user in.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
        attrs: SignUpAttrs,
    ) -> impl Future<Output = RevlyResult<User>> + Send;

    /// Best-effort remote session invalidation.
    fn sign_out(&self, access_token: &str) -> impl Future<Output = RevlyResult<()>> + Send;

    /// Validate an existing access token. `None` means no live session.
    fn get_session(
        &self,
        access_token: &str,
    ) -> impl Future<Output = RevlyResult<Option<AuthedSession>>> + Send;

    /// Exchange a refresh token for a fresh session.
    fn refresh_session(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = RevlyResult<AuthedSession>> + Send;
}

// ---------------------------------------------------------------------------
// Profile lookup
// ---------------------------------------------------------------------------

pub trait ProfileService: Send + Sync {
    /// Fetch the profile for a user. `None` when the record is missing.
    fn fetch(&self, user_id: Uuid) -> impl Future<Output = RevlyResult<Option<Profile>>> + Send;

    /// Partially update a profile and return the stored record.
    fn update(
        &self,
        user_id: Uuid,
        input: UpdateProfile,
    ) -> impl Future<Output = RevlyResult<Profile>> + Send;
}

// ---------------------------------------------------------------------------
// Tenants
// ---------------------------------------------------------------------------

pub trait TenantService: Send + Sync {
    /// Tenant the given principal is assigned to.
    ///
    /// `None` is the valid "not assigned to any tenant" state, not an
    /// error.
    fn current_for(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = RevlyResult<Option<Tenant>>> + Send;

    /// Full tenant list. The backend only serves this to platform
    /// admins.
    fn list_all(&self) -> impl Future<Output = RevlyResult<Vec<Tenant>>> + Send;

    fn get(&self, id: Uuid) -> impl Future<Output = RevlyResult<Tenant>> + Send;

    fn metrics(&self, tenant_id: Uuid) -> impl Future<Output = RevlyResult<TenantMetrics>> + Send;

    fn create(&self, input: CreateTenant) -> impl Future<Output = RevlyResult<Tenant>> + Send;

    fn update(
        &self,
        id: Uuid,
        input: UpdateTenant,
    ) -> impl Future<Output = RevlyResult<Tenant>> + Send;

    fn delete(&self, id: Uuid) -> impl Future<Output = RevlyResult<()>> + Send;
}
