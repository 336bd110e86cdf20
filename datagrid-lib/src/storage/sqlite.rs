//! SQLite settings backend.

use std::path::Path;

use async_sqlite::Client;
use async_sqlite::ClientBuilder;
use async_sqlite::JournalMode;
use async_sqlite::rusqlite;
use async_sqlite::rusqlite::OptionalExtension;
use async_trait::async_trait;
use dashmap::DashMap;

use super::SettingsBackend;
use crate::error::StorageError;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS grid_settings (
    key TEXT PRIMARY KEY,
    value BLOB NOT NULL,
    updated_at INTEGER NOT NULL
)";

/// SQLite-backed settings that persist across restarts.
///
/// Reads go through a cache that also remembers absent keys, so a grid that
/// has never been resized does not hit the database on every mount.
///
/// # Example
///
/// ```ignore
/// use datagrid_lib::storage::SqliteBackend;
///
/// let backend = SqliteBackend::open("settings.db").await?;
/// ```
pub struct SqliteBackend {
    client: Client,
    cache: DashMap<String, Option<Vec<u8>>>,
}

impl SqliteBackend {
    /// Opens (or creates) the settings database at `path` in WAL mode.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let client = ClientBuilder::new()
            .path(path)
            .journal_mode(JournalMode::Wal)
            .open()
            .await?;
        Self::with_client(client).await
    }

    /// Opens a private in-memory database.
    pub async fn open_in_memory() -> Result<Self, StorageError> {
        let client = ClientBuilder::new().path(":memory:").open().await?;
        Self::with_client(client).await
    }

    async fn with_client(client: Client) -> Result<Self, StorageError> {
        client.conn(|conn| conn.execute(SCHEMA, [])).await?;
        Ok(Self {
            client,
            cache: DashMap::new(),
        })
    }
}

#[async_trait]
impl SettingsBackend for SqliteBackend {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if let Some(cached) = self.cache.get(key) {
            return Ok(cached.clone());
        }

        let lookup = key.to_string();
        let value = self
            .client
            .conn(move |conn| {
                conn.query_row("SELECT value FROM grid_settings WHERE key = ?1", [&lookup], |row| {
                    row.get::<_, Vec<u8>>(0)
                })
                .optional()
            })
            .await?;

        self.cache.insert(key.to_string(), value.clone());
        Ok(value)
    }

    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let row_key = key.to_string();
        let row_value = value.clone();
        self.client
            .conn(move |conn| {
                conn.execute(
                    "INSERT INTO grid_settings (key, value, updated_at) VALUES (?1, ?2, strftime('%s', 'now'))
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                    rusqlite::params![row_key, row_value],
                )
            })
            .await?;

        self.cache.insert(key.to_string(), Some(value));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let row_key = key.to_string();
        self.client
            .conn(move |conn| conn.execute("DELETE FROM grid_settings WHERE key = ?1", [row_key]))
            .await?;

        self.cache.insert(key.to_string(), None);
        Ok(())
    }
}
