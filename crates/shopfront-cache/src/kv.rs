//! Key-Value store wrapper with automatic serialization.

use std::path::Path;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use crate::backend::{Backend, FileBackend, MemoryBackend};
use crate::CacheError;

/// Type-safe session store.
///
/// Provides automatic JSON serialization for any type that implements
/// `Serialize` and `DeserializeOwned`. Cloning shares the same backend.
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn Backend>,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}

impl Cache {
    /// Open an isolated in-memory store.
    pub fn memory() -> Self {
        Self::with_backend(MemoryBackend::new())
    }

    /// Open a store persisted to a JSON file.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let cache = Cache::open_file(".shopfront/session.json")?;
    /// ```
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        Ok(Self::with_backend(FileBackend::open(path)?))
    }

    /// Wrap a custom backend.
    pub fn with_backend(backend: impl Backend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Get a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let pending: Option<PendingOrder> = cache.get("pendingOrderData")?;
    /// ```
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.backend.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Set a value in the cache.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value)?;
        self.backend.set(key, raw)
    }

    /// Delete a value from the cache.
    pub fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.backend.delete(key)
    }

    /// Delete several keys, stopping at the first failure.
    pub fn delete_all<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Result<(), CacheError> {
        for key in keys {
            self.backend.delete(key)?;
        }
        Ok(())
    }

    /// Check if a key exists in the cache.
    pub fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.backend.get(key)?.is_some())
    }

    /// Get all keys in the cache.
    pub fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.backend.keys()
    }
}
