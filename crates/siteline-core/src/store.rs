// ── Key-value persistence primitive ──
//
// String keys, JSON string values, swallow-and-log on failure. The
// trait never surfaces storage errors: a failed write is a `warn!`,
// a failed read is `None`. Callers that need stronger guarantees
// don't exist in this codebase.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Minimal persistent key-value surface.
pub trait KeyValueStore: Send + Sync {
    /// The raw JSON string stored under `key`, if any.
    fn get_raw(&self, key: &str) -> Option<String>;

    /// Store a raw JSON string under `key`, overwriting.
    fn set_raw(&self, key: &str, value: String);

    /// Remove `key`. Removing an absent key is a no-op.
    fn remove(&self, key: &str);
}

/// Read and deserialize the value under `key`. Parse failures are
/// logged and collapse to `None` — a corrupt entry is the same as an
/// absent one.
pub fn get_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get_raw(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, error = %err, "stored value failed to deserialize, treating as absent");
            None
        }
    }
}

/// Serialize and store `value` under `key`. Serialization failures are
/// logged and absorbed.
pub fn set_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => store.set_raw(key, raw),
        Err(err) => warn!(key, error = %err, "value failed to serialize, not stored"),
    }
}

// ── In-memory store ─────────────────────────────────────────────────

/// Ephemeral store backed by a `DashMap`. The default for tests and for
/// sessions that don't want license state to outlive the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn set_raw(&self, key: &str, value: String) {
        self.entries.insert(key.to_owned(), value);
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}

// ── File-backed store ───────────────────────────────────────────────

/// One JSON object per store file, loaded eagerly at construction and
/// written through on every mutation. Meant for small payloads (the
/// license cache is a single entry); not a database.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl JsonFileStore {
    /// Open (or lazily create) the store at `path`. An unreadable or
    /// corrupt file starts the store empty rather than failing.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "store file is corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "store file unreadable, starting empty");
                HashMap::new()
            }
        };
        debug!(path = %path.display(), entries = entries.len(), "opened json store");
        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    fn flush(&self, entries: &HashMap<String, String>) {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!(path = %self.path.display(), error = %err, "could not create store directory");
                return;
            }
        }
        let raw = match serde_json::to_string_pretty(entries) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "store contents failed to serialize");
                return;
            }
        };
        if let Err(err) = fs::write(&self.path, raw) {
            warn!(path = %self.path.display(), error = %err, "store write failed");
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .expect("store lock poisoned")
            .get(key)
            .cloned()
    }

    fn set_raw(&self, key: &str, value: String) {
        let mut entries = self.entries.write().expect("store lock poisoned");
        entries.insert(key.to_owned(), value);
        self.flush(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.write().expect("store lock poisoned");
        if entries.remove(key).is_some() {
            self.flush(&entries);
        }
    }
}
