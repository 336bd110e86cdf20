//! Error types

mod api;
mod config;
mod export;
mod storage;

pub use api::*;
pub use config::*;
pub use export::*;
pub use storage::*;

/// Any error surfaced by the grid.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Fetching a page from the data source failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The settings backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The table configuration could not be parsed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Writing an export failed.
    #[error(transparent)]
    Export(#[from] ExportError),
}
