//! Local state persistence.
//!
//! Each store persists a partial snapshot of its state to a shared
//! durable keyed area, under its own key. Snapshots travel inside a
//! versioned [`Envelope`]; a version mismatch or an undecodable
//! payload means discard-and-refetch, never a crash.
//!
//! All operations are synchronous — the persisted-state read during
//! store initialization is the one non-suspending step in the model.
//! Writes are last-writer-wins per key; the two stores never share a
//! key, so no cross-store write race exists.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use revly_core::{RevlyError, RevlyResult};

/// Key the session store persists under.
pub const SESSION_STATE_KEY: &str = "session";
/// Key the tenant store persists under.
pub const TENANT_STATE_KEY: &str = "tenant";

/// Versioned wrapper around a persisted payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub version: u32,
    pub payload: serde_json::Value,
}

/// Durable keyed snapshot area.
///
/// Implementations must tolerate concurrent use from multiple stores;
/// each store only ever touches its own key.
pub trait StateStore: Send + Sync {
    fn load(&self, key: &str) -> RevlyResult<Option<Envelope>>;
    fn save(&self, key: &str, envelope: &Envelope) -> RevlyResult<()>;
    fn remove(&self, key: &str) -> RevlyResult<()>;
}

/// Load a payload, discarding anything unreadable or from another
/// schema version.
pub fn load_versioned<T, K>(store: &K, key: &str, version: u32) -> Option<T>
where
    T: DeserializeOwned,
    K: StateStore + ?Sized,
{
    let envelope = match store.load(key) {
        Ok(Some(envelope)) => envelope,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "failed to load persisted state");
            return None;
        }
    };

    if envelope.version != version {
        warn!(
            key,
            found = envelope.version,
            expected = version,
            "discarding persisted state with mismatched schema version"
        );
        return None;
    }

    match serde_json::from_value(envelope.payload) {
        Ok(payload) => Some(payload),
        Err(e) => {
            warn!(key, error = %e, "discarding undecodable persisted state");
            None
        }
    }
}

/// Persist a payload under a versioned envelope. Best-effort: a failed
/// write is logged and swallowed — persistence must never take a store
/// down.
pub fn save_versioned<T, K>(store: &K, key: &str, version: u32, payload: &T)
where
    T: Serialize,
    K: StateStore + ?Sized,
{
    let payload = match serde_json::to_value(payload) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "failed to encode state for persistence");
            return;
        }
    };

    if let Err(e) = store.save(key, &Envelope { version, payload }) {
        warn!(key, error = %e, "failed to persist state");
    }
}

// ---------------------------------------------------------------------------
// File-backed implementation
// ---------------------------------------------------------------------------

/// One JSON file per key under a state directory.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Platform data directory (`<data_dir>/revly`), falling back to
    /// the current directory when the platform has none.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("revly")
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StateStore for FileStateStore {
    fn load(&self, key: &str) -> RevlyResult<Option<Envelope>> {
        let path = self.path_for(key);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(RevlyError::Persistence(format!(
                    "read {}: {e}",
                    path.display()
                )));
            }
        };

        let envelope = serde_json::from_str(&contents).map_err(|e| {
            RevlyError::Persistence(format!("parse {}: {e}", path.display()))
        })?;
        Ok(Some(envelope))
    }

    fn save(&self, key: &str, envelope: &Envelope) -> RevlyResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            RevlyError::Persistence(format!("create {}: {e}", self.dir.display()))
        })?;

        let path = self.path_for(key);
        let contents = serde_json::to_string_pretty(envelope)
            .map_err(|e| RevlyError::Persistence(format!("encode {key}: {e}")))?;
        std::fs::write(&path, contents).map_err(|e| {
            RevlyError::Persistence(format!("write {}: {e}", path.display()))
        })
    }

    fn remove(&self, key: &str) -> RevlyResult<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RevlyError::Persistence(format!(
                "remove {}: {e}",
                path.display()
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory implementation (tests, demos)
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryStateStore {
    entries: Mutex<HashMap<String, Envelope>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Envelope>> {
        // A poisoned lock only means a panic happened mid-write; the
        // map itself is still structurally valid.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self, key: &str) -> RevlyResult<Option<Envelope>> {
        Ok(self.entries().get(key).cloned())
    }

    fn save(&self, key: &str, envelope: &Envelope) -> RevlyResult<()> {
        self.entries().insert(key.to_string(), envelope.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> RevlyResult<()> {
        self.entries().remove(key);
        Ok(())
    }
}

impl StateStore for std::sync::Arc<MemoryStateStore> {
    fn load(&self, key: &str) -> RevlyResult<Option<Envelope>> {
        self.as_ref().load(key)
    }

    fn save(&self, key: &str, envelope: &Envelope) -> RevlyResult<()> {
        self.as_ref().save(key, envelope)
    }

    fn remove(&self, key: &str) -> RevlyResult<()> {
        self.as_ref().remove(key)
    }
}
