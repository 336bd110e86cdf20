//! Durable key/value storage for grid preferences.
//!
//! Backends store raw bytes by string key. Callers layer their own encoding
//! on top (see [`crate::sizing::SizingStore`]).

mod memory;
mod sqlite;

pub use memory::*;
pub use sqlite::*;

use async_trait::async_trait;

use crate::error::StorageError;

/// A store of preference blobs shared by every grid in the process.
///
/// Failures are reported, never swallowed; deciding whether a failure is
/// fatal is up to the caller.
#[async_trait]
pub trait SettingsBackend: Send + Sync {
    /// Stored value for `key`, `None` when absent.
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
