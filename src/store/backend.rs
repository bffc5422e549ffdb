//! Raw string-keyed storage backends.
//!
//! `MemoryBackend` mirrors an always-available store with an optional byte
//! quota (exercising the quota-exceeded failure path). `FileBackend` persists
//! the whole map as one JSON document with staged atomic writes.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::StoreError;

/// Raw storage contract. Implementations are injected into
/// [`SharedStorage`](super::SharedStorage); callers never touch them directly.
pub trait StorageBackend: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Removes a key, returning the previous value if present.
    fn remove(&mut self, key: &str) -> Result<Option<String>, StoreError>;
    fn clear(&mut self) -> Result<(), StoreError>;
    fn keys(&self) -> Vec<String>;

    /// Total stored bytes (keys plus values).
    fn size_bytes(&self) -> usize {
        self.keys()
            .iter()
            .map(|k| k.len() + self.get(k).map_or(0, |v| v.len()))
            .sum()
    }
}

// ═══════════════════════════════════════════════════════════
// MemoryBackend
// ═══════════════════════════════════════════════════════════

/// In-memory backend, optionally bounded by a byte quota.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that rejects writes once `quota_bytes` of keys + values are held.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(quota) = self.quota_bytes {
            let current: usize = self
                .entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let attempted = current + key.len() + value.len();
            if attempted > quota {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    attempted,
                    quota,
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.remove(key))
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.entries.clear();
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

// ═══════════════════════════════════════════════════════════
// FileBackend
// ═══════════════════════════════════════════════════════════

/// File-backed store: the whole key/value map as one JSON document.
///
/// Writes are staged to a temp file in the same directory and renamed into
/// place, so a crash mid-write leaves the previous document intact. A
/// malformed document on open degrades to an empty map (logged), matching
/// the read-boundary policy: corrupt data is never surfaced as an error.
pub struct FileBackend {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileBackend {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Store file malformed, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(StoreError::Io(e)),
        };
        Ok(Self { path, entries })
    }

    fn persist(&self) -> Result<(), StoreError> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;
        let raw = serde_json::to_string_pretty(&self.entries).map_err(|e| {
            StoreError::Serialization {
                key: "*".into(),
                reason: e.to_string(),
            }
        })?;
        let mut staged = tempfile::NamedTempFile::new_in(parent)?;
        staged.write_all(raw.as_bytes())?;
        staged
            .persist(&self.path)
            .map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let previous = self.entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist() {
            // Roll back the in-memory map so memory and disk agree.
            match previous {
                Some(old) => self.entries.insert(key.to_string(), old),
                None => self.entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        let previous = self.entries.remove(key);
        if previous.is_some() {
            if let Err(e) = self.persist() {
                if let Some(ref old) = previous {
                    self.entries.insert(key.to_string(), old.clone());
                }
                return Err(e);
            }
        }
        Ok(previous)
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        let previous = std::mem::take(&mut self.entries);
        if let Err(e) = self.persist() {
            self.entries = previous;
            return Err(e);
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ───────────────────────────────────────
    // MemoryBackend
    // ───────────────────────────────────────

    #[test]
    fn memory_set_get_round_trip() {
        let mut backend = MemoryBackend::new();
        backend.set("patients", "[]").unwrap();
        assert_eq!(backend.get("patients").as_deref(), Some("[]"));
    }

    #[test]
    fn memory_remove_returns_previous() {
        let mut backend = MemoryBackend::new();
        backend.set("theme", "\"dark\"").unwrap();
        assert_eq!(backend.remove("theme").unwrap().as_deref(), Some("\"dark\""));
        assert_eq!(backend.remove("theme").unwrap(), None);
    }

    #[test]
    fn memory_quota_rejects_oversized_write() {
        let mut backend = MemoryBackend::with_quota(16);
        backend.set("a", "12345").unwrap();
        let err = backend.set("b", &"x".repeat(32)).unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { .. }));
        // Prior contents untouched.
        assert_eq!(backend.get("a").as_deref(), Some("12345"));
    }

    #[test]
    fn memory_quota_allows_overwrite_within_budget() {
        let mut backend = MemoryBackend::with_quota(10);
        backend.set("k", "12345").unwrap();
        backend.set("k", "67890").unwrap();
        assert_eq!(backend.get("k").as_deref(), Some("67890"));
    }

    #[test]
    fn memory_clear_empties_all_keys() {
        let mut backend = MemoryBackend::new();
        backend.set("a", "1").unwrap();
        backend.set("b", "2").unwrap();
        backend.clear().unwrap();
        assert!(backend.keys().is_empty());
    }

    // ───────────────────────────────────────
    // FileBackend
    // ───────────────────────────────────────

    #[test]
    fn file_backend_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        {
            let mut backend = FileBackend::open(&path).unwrap();
            backend.set("users", "[{\"id\":\"1\"}]").unwrap();
        }
        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.get("users").as_deref(), Some("[{\"id\":\"1\"}]"));
    }

    #[test]
    fn file_backend_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path().join("absent.json")).unwrap();
        assert!(backend.keys().is_empty());
    }

    #[test]
    fn file_backend_malformed_document_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();
        let backend = FileBackend::open(&path).unwrap();
        assert!(backend.keys().is_empty());
    }

    #[test]
    fn file_backend_remove_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        {
            let mut backend = FileBackend::open(&path).unwrap();
            backend.set("theme", "\"light\"").unwrap();
            backend.remove("theme").unwrap();
        }
        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.get("theme"), None);
    }
}
