//! Key-value store trait and in-memory implementation.

use std::future::Future;
use std::pin::Pin;

use dashmap::DashMap;

use crate::core::errors::ChatResult;

/// Boxed future type for store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// String blob store keyed by namespace.
pub trait KeyValueStore: Send + Sync {
    /// Read the blob stored under `key`.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn get(&self, key: &str) -> StoreFuture<'_, ChatResult<Option<String>>>;

    /// Replace the blob stored under `key`.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn set(&self, key: &str, value: String) -> StoreFuture<'_, ChatResult<()>>;

    /// Remove the blob stored under `key`. Missing keys are not an error.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn remove(&self, key: &str) -> StoreFuture<'_, ChatResult<()>>;
}

/// Process-local store, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of namespaces currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreFuture<'_, ChatResult<Option<String>>> {
        let value = self.entries.get(key).map(|entry| entry.value().clone());
        Box::pin(async move { Ok(value) })
    }

    fn set(&self, key: &str, value: String) -> StoreFuture<'_, ChatResult<()>> {
        self.entries.insert(key.to_string(), value);
        Box::pin(async { Ok(()) })
    }

    fn remove(&self, key: &str) -> StoreFuture<'_, ChatResult<()>> {
        self.entries.remove(key);
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.set("a", "1".to_string()).await.unwrap();
        store.set("a", "2".to_string()).await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("2"));
        assert_eq!(store.len(), 1);

        store.remove("a").await.unwrap();
        store.remove("a").await.unwrap();
        assert!(store.get("a").await.unwrap().is_none());
    }
}
