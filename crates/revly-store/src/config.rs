//! Store configuration.

/// Configuration shared by the session and tenant stores.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Persisted sessions idle for longer than this are discarded on
    /// rehydration (default: 1800 = 30 minutes).
    pub session_timeout_secs: u64,
    /// How long a fetched tenant list stays valid before `initialize`
    /// refetches it (default: 300 = 5 minutes).
    pub tenant_cache_ttl_secs: u64,
    /// How close to token expiry a session is flagged as expiring soon
    /// (default: 300 = 5 minutes).
    pub expiry_warning_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            session_timeout_secs: 1800,
            tenant_cache_ttl_secs: 300,
            expiry_warning_secs: 300,
        }
    }
}
