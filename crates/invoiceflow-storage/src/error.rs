//! Storage error types.

/// Errors raised by a [`StorageBackend`](crate::StorageBackend).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backing file could not be opened or created.
    #[error("failed to open storage at '{path}': {reason}")]
    Open { path: String, reason: String },

    /// Reading a key (or the key listing) failed.
    #[error("failed to read key '{key}': {reason}")]
    Read { key: String, reason: String },

    /// Writing a key failed.
    #[error("failed to write key '{key}': {reason}")]
    Write { key: String, reason: String },

    /// Removing a key failed.
    #[error("failed to remove key '{key}': {reason}")]
    Remove { key: String, reason: String },

    /// The write would push the store past its byte quota.
    #[error("storage quota exceeded writing '{key}': {used} of {quota} bytes in use")]
    QuotaExceeded { key: String, used: usize, quota: usize },

    /// A transaction could not be started or committed.
    #[error("storage transaction failed: {reason}")]
    Transaction { reason: String },
}
