//! HTTP implementations of the core service traits.

mod identity;
mod profiles;
mod tenants;

pub use identity::HttpIdentityService;
pub use profiles::HttpProfileService;
pub use tenants::HttpTenantService;
