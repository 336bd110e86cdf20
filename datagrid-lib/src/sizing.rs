//! Column width persistence.
//!
//! Widths are stored as JSON under `table-column-sizing-{table_id}`. Reads
//! are best effort: a failing backend or a corrupt value reads as "nothing
//! stored" so the grid falls back to the declared defaults.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::engine::ColumnDef;
use crate::error::StorageError;
use crate::storage::SettingsBackend;

/// Column id to width in pixels.
pub type ColumnSizing = BTreeMap<String, u32>;

/// Storage key for one table's widths.
pub fn storage_key(table_id: &str) -> String {
    format!("table-column-sizing-{}", table_id)
}

/// Reads and writes persisted column widths.
#[derive(Clone)]
pub struct SizingStore {
    backend: Arc<dyn SettingsBackend>,
}

impl SizingStore {
    /// Creates a store over a settings backend.
    pub fn new(backend: impl SettingsBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Creates a store over a shared backend.
    pub fn from_arc(backend: Arc<dyn SettingsBackend>) -> Self {
        Self { backend }
    }

    /// Returns the stored widths, or `None` when nothing usable is stored.
    pub async fn get_sizing(&self, table_id: &str) -> Option<ColumnSizing> {
        let key = storage_key(table_id);
        let bytes = match self.backend.get_bytes(&key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("column sizing read failed for '{}': {}", table_id, e);
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(sizing) => Some(sizing),
            Err(e) => {
                log::warn!("ignoring corrupt column sizing for '{}': {}", table_id, e);
                None
            }
        }
    }

    /// Persists widths for a table, replacing what was stored.
    pub async fn set_sizing(&self, table_id: &str, sizing: &ColumnSizing) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(sizing)?;
        self.backend.set_bytes(&storage_key(table_id), bytes).await
    }

    /// Removes the stored widths for a table.
    pub async fn reset_sizing(&self, table_id: &str) -> Result<(), StorageError> {
        self.backend.delete(&storage_key(table_id)).await
    }
}

/// In-memory column widths for one mounted table.
///
/// Tracks whether defaults may still be applied and counts layout
/// invalidations so renderers know to re-measure.
#[derive(Debug, Clone)]
pub struct ColumnSizingState {
    table_id: String,
    enabled: bool,
    sizing: ColumnSizing,
    layout_epoch: u64,
}

impl ColumnSizingState {
    /// Creates empty sizing for a table. When `enabled` is `false` nothing is
    /// read from or written to storage.
    pub fn new(table_id: impl Into<String>, enabled: bool) -> Self {
        Self {
            table_id: table_id.into(),
            enabled,
            sizing: ColumnSizing::new(),
            layout_epoch: 0,
        }
    }

    /// The table id used as storage key suffix.
    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    /// Returns `true` when widths are persisted.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current widths.
    pub fn sizing(&self) -> &ColumnSizing {
        &self.sizing
    }

    /// Incremented every time the layout must be measured again.
    pub fn layout_epoch(&self) -> u64 {
        self.layout_epoch
    }

    /// Loads stored widths. Returns whether a stored value existed.
    pub async fn hydrate(&mut self, store: &SizingStore) -> bool {
        if !self.enabled {
            return false;
        }
        match store.get_sizing(&self.table_id).await {
            Some(stored) => {
                self.sizing = stored;
                true
            }
            None => false,
        }
    }

    /// Applies the declared default widths, but only when nothing is stored
    /// and nothing is set in memory. Returns whether defaults were applied.
    ///
    /// Defaults are not persisted.
    pub fn apply_defaults(&mut self, columns: &[ColumnDef], stored_exists: bool) -> bool {
        if stored_exists || !self.sizing.is_empty() {
            return false;
        }
        let defaults = default_sizing(columns);
        if defaults.is_empty() {
            return false;
        }
        self.sizing = defaults;
        true
    }

    /// Replaces the widths after an explicit user change and persists them.
    /// Returns `false` when nothing changed.
    pub async fn set(&mut self, sizing: ColumnSizing, store: &SizingStore) -> bool {
        if sizing == self.sizing {
            return false;
        }
        self.sizing = sizing;
        if self.enabled
            && let Err(e) = store.set_sizing(&self.table_id, &self.sizing).await
        {
            log::warn!("column sizing write failed for '{}': {}", self.table_id, e);
        }
        true
    }

    /// Clears memory and storage and requests a re-measure.
    pub async fn reset(&mut self, store: &SizingStore) {
        self.sizing.clear();
        if self.enabled
            && let Err(e) = store.reset_sizing(&self.table_id).await
        {
            log::warn!("column sizing reset failed for '{}': {}", self.table_id, e);
        }
        self.layout_epoch += 1;
    }
}

/// Declared widths of the columns that declare one.
pub fn default_sizing(columns: &[ColumnDef]) -> ColumnSizing {
    columns
        .iter()
        .filter_map(|column| column.size.map(|size| (column.id.clone(), size)))
        .collect()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::storage::MemoryBackend;

    struct BrokenBackend;

    #[async_trait]
    impl SettingsBackend for BrokenBackend {
        async fn get_bytes(&self, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        async fn set_bytes(&self, _key: &str, _value: Vec<u8>) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        async fn delete(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }
    }

    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("name", "Name").size(200),
            ColumnDef::new("email", "Email").size(250),
            ColumnDef::new("notes", "Notes"),
        ]
    }

    fn sizing(pairs: &[(&str, u32)]) -> ColumnSizing {
        pairs.iter().map(|(id, w)| (id.to_string(), *w)).collect()
    }

    #[tokio::test]
    async fn test_store_round_trip() {
        let store = SizingStore::new(MemoryBackend::new());
        assert_eq!(store.get_sizing("users").await, None);

        store.set_sizing("users", &sizing(&[("name", 180)])).await.unwrap();
        assert_eq!(store.get_sizing("users").await, Some(sizing(&[("name", 180)])));

        store.reset_sizing("users").await.unwrap();
        assert_eq!(store.get_sizing("users").await, None);
    }

    #[tokio::test]
    async fn test_corrupt_value_reads_as_missing() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .set_bytes(&storage_key("users"), b"{not json".to_vec())
            .await
            .unwrap();
        let store = SizingStore::from_arc(backend);
        assert_eq!(store.get_sizing("users").await, None);
    }

    #[tokio::test]
    async fn test_failing_read_yields_defaults() {
        let store = SizingStore::new(BrokenBackend);
        let mut state = ColumnSizingState::new("users", true);
        let stored = state.hydrate(&store).await;
        assert!(!stored);
        assert!(state.apply_defaults(&columns(), stored));
        assert_eq!(state.sizing(), &sizing(&[("name", 200), ("email", 250)]));
    }

    #[tokio::test]
    async fn test_defaults_do_not_clobber_memory() {
        let store = SizingStore::new(MemoryBackend::new());
        let mut state = ColumnSizingState::new("users", true);
        state.set(sizing(&[("name", 320)]), &store).await;
        assert!(!state.apply_defaults(&columns(), false));
        assert_eq!(state.sizing(), &sizing(&[("name", 320)]));
    }

    #[tokio::test]
    async fn test_defaults_skipped_when_stored() {
        let mut state = ColumnSizingState::new("users", true);
        assert!(!state.apply_defaults(&columns(), true));
        assert!(state.sizing().is_empty());
    }

    #[tokio::test]
    async fn test_failing_write_keeps_memory() {
        let store = SizingStore::new(BrokenBackend);
        let mut state = ColumnSizingState::new("users", true);
        assert!(state.set(sizing(&[("name", 90)]), &store).await);
        assert_eq!(state.sizing(), &sizing(&[("name", 90)]));
    }

    #[tokio::test]
    async fn test_reset_clears_and_bumps_epoch() {
        let backend = Arc::new(MemoryBackend::new());
        let store = SizingStore::from_arc(backend.clone());
        let mut state = ColumnSizingState::new("users", true);
        state.set(sizing(&[("name", 90)]), &store).await;
        assert_eq!(backend.len(), 1);

        state.reset(&store).await;
        assert!(state.sizing().is_empty());
        assert_eq!(state.layout_epoch(), 1);
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_never_touches_storage() {
        let backend = Arc::new(MemoryBackend::new());
        let store = SizingStore::from_arc(backend.clone());
        backend
            .set_bytes(&storage_key("users"), b"{\"name\":99}".to_vec())
            .await
            .unwrap();

        let mut state = ColumnSizingState::new("users", false);
        assert!(!state.hydrate(&store).await);
        state.set(sizing(&[("name", 10)]), &store).await;
        assert_eq!(store.get_sizing("users").await, Some(sizing(&[("name", 99)])));
    }
}
