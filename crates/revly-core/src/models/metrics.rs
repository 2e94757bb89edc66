//! Tenant usage metrics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Point-in-time usage snapshot for one tenant.
///
/// Metrics have no identity of their own — a snapshot is always scoped
/// to exactly one tenant and replaced wholesale on refresh, never
/// merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantMetrics {
    pub tenant_id: Uuid,
    pub user_count: u64,
    pub review_count: u64,
    pub active_users: u64,
    pub storage_bytes: u64,
    pub api_calls: u64,
    pub last_activity_at: Option<DateTime<Utc>>,
}
