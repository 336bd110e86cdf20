//! Export error types

/// Errors raised while writing an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// CSV encoding failed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Writing the output failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// There was nothing to export.
    #[error("nothing to export")]
    Empty,
}
