//! Revly Store — the session/tenant state containers and their
//! composition layer.
//!
//! Two independently persisted, lazily initialized stores plus one
//! composition layer:
//!
//! - [`SessionStore`] owns identity: the authenticated principal, the
//!   session token lifecycle, and the derived profile.
//! - [`TenantStore`] owns the active tenant, the list of tenants the
//!   principal may switch between, and cached usage metrics. It reads
//!   the principal from the session store through the narrow
//!   [`PrincipalSource`] seam.
//! - [`AppStore`] combines both into one read model and coordinates
//!   joint initialization and reset.
//!
//! Consumers subscribe to snapshots and their derived flags
//! (`is_authenticated`, `is_tenant_active`, role checks) rather than
//! raw state.

pub mod compose;
pub mod config;
pub mod error;
pub mod freshness;
pub mod persist;
pub mod principal;
pub mod session;
pub mod tenant;

pub use compose::{AppSnapshot, AppStore};
pub use config::StoreConfig;
pub use error::StoreError;
pub use freshness::Freshness;
pub use persist::{FileStateStore, MemoryStateStore, StateStore};
pub use principal::PrincipalSource;
pub use session::{SessionSnapshot, SessionStore};
pub use tenant::{TenantSnapshot, TenantStore};
