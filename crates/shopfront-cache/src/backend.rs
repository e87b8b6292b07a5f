//! Storage backends.

use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::CacheError;

/// A raw string-keyed store of serialized documents.
///
/// Implementations must be safe to share between tasks; the engine holds
/// the cache behind an `Arc`.
pub trait Backend: Send + Sync {
    /// Read the raw document stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a raw document under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String) -> Result<(), CacheError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// List all keys currently stored.
    fn keys(&self) -> Result<Vec<String>, CacheError>;
}

/// Process-local backend. Each instance is an isolated "tab".
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> CacheError {
    CacheError::StoreError("lock poisoned".to_string())
}

impl Backend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.keys().cloned().collect())
    }
}

/// Backend persisted as a single JSON object on disk.
///
/// Used by the CLI so a pending gateway payment survives between
/// invocations the way session storage survives a redirect. Every write
/// replaces the whole file through a sibling temp file and a rename.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileBackend {
    /// Open (or lazily create) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    CacheError::OpenError(format!("{}: {}", path.display(), e))
                })?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `.session.json.tmp.<pid>` next to the target, so the rename stays on one filesystem.
    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("session");
        self.path
            .with_file_name(format!(".{}.tmp.{}", name, std::process::id()))
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(entries)?;
        let tmp = self.temp_path();
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        tracing::debug!(path = %self.path.display(), keys = entries.len(), "flushed session store");
        Ok(())
    }
}

impl Backend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(key.to_string(), value);
        self.flush(&entries)
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_backend_roundtrip() {
        let backend = MemoryBackend::new();
        backend.set("a", "1".to_string()).unwrap();
        assert_eq!(backend.get("a").unwrap(), Some("1".to_string()));
        backend.delete("a").unwrap();
        assert_eq!(backend.get("a").unwrap(), None);
    }

    #[test]
    fn test_memory_backend_delete_missing_is_ok() {
        let backend = MemoryBackend::new();
        assert!(backend.delete("missing").is_ok());
    }

    #[test]
    fn test_file_backend_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let backend = FileBackend::open(&path).unwrap();
        backend.set("pendingOrderData", r#"{"x":1}"#.to_string()).unwrap();
        drop(backend);

        let reopened = FileBackend::open(&path).unwrap();
        assert_eq!(
            reopened.get("pendingOrderData").unwrap(),
            Some(r#"{"x":1}"#.to_string())
        );
        assert_eq!(reopened.keys().unwrap(), vec!["pendingOrderData".to_string()]);
    }

    #[test]
    fn test_file_backend_replaces_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let backend = FileBackend::open(&path).unwrap();
        backend.set("a", "1".to_string()).unwrap();
        backend.set("b", "2".to_string()).unwrap();
        backend.delete("a").unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["session.json".to_string()]);

        let on_disk: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 1);
        assert_eq!(on_disk.get("b"), Some(&"2".to_string()));
    }

    #[test]
    fn test_stale_temp_file_does_not_affect_reads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let backend = FileBackend::open(&path).unwrap();
        backend.set("a", "1".to_string()).unwrap();

        // a crash between create and rename leaves only the temp file behind
        std::fs::write(backend.temp_path(), "{\"a\": tru").unwrap();

        let reopened = FileBackend::open(&path).unwrap();
        assert_eq!(reopened.get("a").unwrap(), Some("1".to_string()));
    }

    #[test]
    fn test_file_backend_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            FileBackend::open(&path),
            Err(CacheError::OpenError(_))
        ));
    }
}
