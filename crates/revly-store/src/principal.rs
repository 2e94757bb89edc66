//! Read-only seam between the tenant store and the session store.

use uuid::Uuid;

/// Source of the currently signed-in principal's id.
///
/// The tenant store reads scope through this trait instead of holding
/// the session store's concrete type; the read is synchronous and
/// never mutates the source.
pub trait PrincipalSource: Send + Sync {
    fn current_user_id(&self) -> Option<Uuid>;
}
