//! File-backed storage on redb.
//!
//! Stands in for the browser's `localStorage`: values outlive the process so
//! the sidebar preference and the auth flag survive a server restart.
//! Feature-gated behind `redb-backend`.
//!
//! Every call runs on the Tokio blocking pool and in its own redb
//! transaction, so each `set` becomes visible atomically.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use crate::{StorageBackend, StorageError};

const ENTRIES: TableDefinition<&str, &str> = TableDefinition::new("entries");

/// A persistent store backed by a single redb file.
///
/// # Examples
///
/// ```no_run
/// # use invoiceflow_storage::RedbBackend;
/// let store = RedbBackend::open("./data/persistent.redb").unwrap();
/// ```
#[derive(Clone)]
pub struct RedbBackend {
    db: Arc<Database>,
    path: PathBuf,
}

impl std::fmt::Debug for RedbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RedbBackend {
    /// Open the database file at `path`, creating it and the entries table
    /// if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the file cannot be opened or the
    /// table cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let open_err = |reason: String| StorageError::Open {
            path: path.display().to_string(),
            reason,
        };

        let db = Database::create(path).map_err(|e| open_err(e.to_string()))?;
        let txn = db.begin_write().map_err(|e| open_err(e.to_string()))?;
        txn.open_table(ENTRIES)
            .map_err(|e| open_err(e.to_string()))?;
        txn.commit().map_err(|e| open_err(e.to_string()))?;

        tracing::debug!(path = %path.display(), "redb storage opened");

        Ok(Self {
            db: Arc::new(db),
            path: path.to_path_buf(),
        })
    }

    /// Filesystem path of the database.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn blocking<T, F>(&self, key: &str, op: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, StorageError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(|e| StorageError::Read {
                key: key.to_owned(),
                reason: format!("blocking task failed: {e}"),
            })?
    }
}

fn txn_err(e: impl std::fmt::Display) -> StorageError {
    StorageError::Transaction {
        reason: e.to_string(),
    }
}

#[async_trait::async_trait]
impl StorageBackend for RedbBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let owned = key.to_owned();
        self.blocking(key, move |db| {
            let txn = db.begin_read().map_err(txn_err)?;
            let table = txn.open_table(ENTRIES).map_err(txn_err)?;
            let value = table
                .get(owned.as_str())
                .map_err(|e| StorageError::Read {
                    key: owned.clone(),
                    reason: e.to_string(),
                })?
                .map(|guard| guard.value().to_owned());
            Ok(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let owned = key.to_owned();
        let value = value.to_owned();
        self.blocking(key, move |db| {
            let txn = db.begin_write().map_err(txn_err)?;
            {
                let mut table = txn.open_table(ENTRIES).map_err(txn_err)?;
                table
                    .insert(owned.as_str(), value.as_str())
                    .map_err(|e| StorageError::Write {
                        key: owned.clone(),
                        reason: e.to_string(),
                    })?;
            }
            txn.commit().map_err(txn_err)
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let owned = key.to_owned();
        self.blocking(key, move |db| {
            let txn = db.begin_write().map_err(txn_err)?;
            {
                let mut table = txn.open_table(ENTRIES).map_err(txn_err)?;
                table
                    .remove(owned.as_str())
                    .map_err(|e| StorageError::Remove {
                        key: owned.clone(),
                        reason: e.to_string(),
                    })?;
            }
            txn.commit().map_err(txn_err)
        })
        .await
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.blocking("*", |db| {
            let txn = db.begin_read().map_err(txn_err)?;
            let table = txn.open_table(ENTRIES).map_err(txn_err)?;
            let read_err = |e: redb::StorageError| StorageError::Read {
                key: "*".to_owned(),
                reason: e.to_string(),
            };
            let mut keys = Vec::new();
            for entry in table.iter().map_err(read_err)? {
                let (k, _) = entry.map_err(read_err)?;
                keys.push(k.value().to_owned());
            }
            Ok(keys)
        })
        .await
    }
}
