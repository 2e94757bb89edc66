//! Tenant domain model.
//!
//! Tenants are the unit of data isolation: each customer organization
//! collects its reviews under exactly one tenant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    Active,
    Suspended,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    Free,
    Starter,
    Pro,
    Enterprise,
}

/// Per-tenant settings: feature switches, usage limits, and display copy
/// for the public review form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantSettings {
    /// Whether the public review form accepts submissions.
    pub public_form_enabled: bool,
    /// Whether review exports are available to tenant admins.
    pub export_enabled: bool,
    pub max_users: u32,
    pub max_reviews_per_month: u32,
    /// Copy shown above the public review form.
    pub welcome_message: Option<String>,
}

impl Default for TenantSettings {
    fn default() -> Self {
        Self {
            public_form_enabled: true,
            export_enabled: false,
            max_users: 5,
            max_reviews_per_month: 500,
            welcome_message: None,
        }
    }
}

/// A customer organization in the multi-tenant model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    /// Custom domain the public review form is served from.
    pub domain: Option<String>,
    pub status: TenantStatus,
    pub plan: PlanTier,
    pub settings: TenantSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

impl Tenant {
    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active
    }
}

/// Fields required to create a new tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub name: String,
    pub domain: Option<String>,
    pub plan: PlanTier,
    pub settings: Option<TenantSettings>,
}

/// Fields that can be updated on an existing tenant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTenant {
    pub name: Option<String>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub domain: Option<Option<String>>,
    pub status: Option<TenantStatus>,
    pub plan: Option<PlanTier>,
    pub settings: Option<TenantSettings>,
}
