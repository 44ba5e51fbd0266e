//! In-memory storage backend.
//!
//! Holds a `BTreeMap` behind a `RwLock`. Nothing survives the process, which
//! is exactly the lifetime of a tab-scoped store. An optional byte quota
//! mimics the `QuotaExceededError` browsers raise when storage is full.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{StorageBackend, StorageError};

/// An in-memory key-value store.
///
/// Clones share the same map.
///
/// # Examples
///
/// ```
/// # use invoiceflow_storage::{MemoryBackend, StorageBackend};
/// # #[tokio::main]
/// # async fn main() {
/// let store = MemoryBackend::new();
/// store.set("if.sidebarCollapsed", "true").await.unwrap();
/// assert_eq!(store.get("if.sidebarCollapsed").await.unwrap().as_deref(), Some("true"));
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    data: Arc<RwLock<BTreeMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryBackend {
    /// Create an empty, unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that refuses writes once keys plus values
    /// would exceed `quota` bytes.
    #[must_use]
    pub fn with_quota(quota: usize) -> Self {
        Self {
            data: Arc::default(),
            quota: Some(quota),
        }
    }

    /// Bytes currently used (keys plus values).
    pub async fn used_bytes(&self) -> usize {
        let data = self.data.read().await;
        footprint(&data)
    }
}

fn footprint(data: &BTreeMap<String, String>) -> usize {
    data.iter().map(|(k, v)| k.len().saturating_add(v.len())).sum()
}

#[async_trait::async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let data = self.data.read().await;
        Ok(data.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut data = self.data.write().await;

        if let Some(quota) = self.quota {
            let previous = data
                .get(key)
                .map_or(0, |old| key.len().saturating_add(old.len()));
            let used = footprint(&data).saturating_sub(previous);
            if used.saturating_add(key.len()).saturating_add(value.len()) > quota {
                tracing::warn!(key, used, quota, "storage quota exceeded");
                return Err(StorageError::QuotaExceeded {
                    key: key.to_owned(),
                    used,
                    quota,
                });
            }
        }

        data.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        data.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let data = self.data.read().await;
        Ok(data.keys().cloned().collect())
    }

    async fn contains(&self, key: &str) -> Result<bool, StorageError> {
        let data = self.data.read().await;
        Ok(data.contains_key(key))
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.data.write().await.clear();
        Ok(())
    }
}
