//! Configuration error types

/// Errors raised while loading a [`TableConfig`](crate::config::TableConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The override document is not valid JSON for the config shape.
    #[error("invalid table config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value parsed but is not acceptable.
    #[error("invalid table config: {field}: {message}")]
    Invalid {
        /// The offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}
