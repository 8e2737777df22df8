use thiserror::Error;

/// Top-level error type for the Opsdesk system.
///
/// Subsystem crates define their own error types and implement
/// `From<OpsdeskError>` so that the `?` operator works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OpsdeskError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for OpsdeskError {
    fn from(err: toml::de::Error) -> Self {
        OpsdeskError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for OpsdeskError {
    fn from(err: toml::ser::Error) -> Self {
        OpsdeskError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for OpsdeskError {
    fn from(err: serde_json::Error) -> Self {
        OpsdeskError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Opsdesk operations.
pub type Result<T> = std::result::Result<T, OpsdeskError>;
