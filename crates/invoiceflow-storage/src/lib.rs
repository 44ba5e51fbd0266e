//! Storage abstraction for `InvoiceFlow`.
//!
//! The dashboard keeps its session flag, session record and UI preferences in
//! what a browser would call Web Storage: a flat map from string keys to
//! string values. This crate defines that interface as the [`StorageBackend`]
//! trait so the core never touches a concrete store.
//!
//! Two implementations are provided:
//!
//! - [`MemoryBackend`]: in-memory map, optionally bounded by a byte quota.
//!   Used for tab-scoped storage and in tests.
//! - [`RedbBackend`]: file-backed store for the persistent scope (feature
//!   `redb-backend`).

mod error;
mod memory;
#[cfg(feature = "redb-backend")]
mod redb_backend;

pub use error::StorageError;
pub use memory::MemoryBackend;
#[cfg(feature = "redb-backend")]
pub use redb_backend::RedbBackend;

/// A Web Storage style key-value store.
///
/// Keys and values are UTF-8 strings. Callers that store structured data
/// serialize it to JSON first; the backend never interprets values.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying store fails.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value in one step.
    ///
    /// # Errors
    ///
    /// - [`StorageError::QuotaExceeded`] if the store is full.
    /// - [`StorageError::Write`] if the underlying store fails.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Remove`] if the underlying store fails.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Every key currently stored, in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying store fails.
    async fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Whether `key` is present.
    ///
    /// The default implementation calls [`get`](StorageBackend::get).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying store fails.
    async fn contains(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Remove every key.
    ///
    /// The default implementation removes the keys one by one.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`keys`](StorageBackend::keys) or
    /// [`remove`](StorageBackend::remove).
    async fn clear(&self) -> Result<(), StorageError> {
        for key in self.keys().await? {
            self.remove(&key).await?;
        }
        Ok(())
    }
}
