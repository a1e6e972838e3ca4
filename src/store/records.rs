//! Namespaced key/value records backed by `SQLite`.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::store::error::{StoreError, StoreResult};

/// Record holding the full conversation list as a JSON array.
pub const CONVERSATIONS_KEY: &str = "undox_conversations";
/// Record holding a credential the user entered directly.
pub const CREDENTIAL_KEY: &str = "undox_near_ai_key";

/// Minimal persisted key/value surface.
pub trait RecordStore: Send + Sync {
    /// Read a record.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Create or overwrite a record.
    ///
    /// # Errors
    /// Returns an error if storage rejects the write.
    fn put(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete a record. Deleting a missing record is not an error.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// `SQLite` implementation of [`RecordStore`].
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
    quota_bytes: Option<usize>,
}

impl SqliteRecordStore {
    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS records (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            quota_bytes: None,
        })
    }

    /// Reject writes that would push the total stored size past `quota`.
    #[must_use]
    pub const fn with_quota_bytes(mut self, quota: Option<usize>) -> Self {
        self.quota_bytes = quota;
        self
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl RecordStore for SqliteRecordStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM records WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        if let Some(quota) = self.quota_bytes {
            let others: i64 = conn.query_row(
                "SELECT COALESCE(SUM(LENGTH(CAST(value AS BLOB))), 0) FROM records WHERE key != ?1",
                params![key],
                |row| row.get(0),
            )?;
            let needed = usize::try_from(others).unwrap_or(usize::MAX) + value.len();
            if needed > quota {
                return Err(StoreError::QuotaExceeded { needed, quota });
            }
        }
        conn.execute(
            "INSERT OR REPLACE INTO records (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM records WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_remove() {
        let store = SqliteRecordStore::in_memory().unwrap();
        assert_eq!(store.get("k").unwrap(), None);

        store.put("k", "one").unwrap();
        store.put("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));

        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_quota_rejects_write_and_keeps_previous_value() {
        let store = SqliteRecordStore::in_memory()
            .unwrap()
            .with_quota_bytes(Some(8));
        store.put("k", "small").unwrap();

        let err = store.put("k", "much too large").unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { quota: 8, .. }));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("small"));
    }

    #[test]
    fn test_file_backed_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.db");
        {
            let store = SqliteRecordStore::open(&path).unwrap();
            store.put(CREDENTIAL_KEY, "secret").unwrap();
        }
        let store = SqliteRecordStore::open(&path).unwrap();
        assert_eq!(store.get(CREDENTIAL_KEY).unwrap().as_deref(), Some("secret"));
    }
}
