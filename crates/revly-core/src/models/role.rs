//! Role hierarchy.
//!
//! The closed set of application roles, ordered
//! `SuperAdmin > TenantAdmin > User`. Access checks go through
//! [`Role::satisfies`] rather than comparing strings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform-level administrator with access to every tenant.
    SuperAdmin,
    /// Administrator of a single tenant.
    TenantAdmin,
    /// Regular tenant member.
    User,
}

impl Role {
    /// Position in the hierarchy; a higher rank grants broader access.
    fn rank(self) -> u8 {
        match self {
            Role::SuperAdmin => 2,
            Role::TenantAdmin => 1,
            Role::User => 0,
        }
    }

    /// Whether a principal holding `self` meets the `required` level.
    pub fn satisfies(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    pub fn is_super_admin(self) -> bool {
        matches!(self, Role::SuperAdmin)
    }
}
