use thiserror::Error;

use opsdesk_core::error::OpsdeskError;

/// Errors that can occur while building insights.
#[derive(Error, Debug)]
pub enum InsightError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid window: {0}")]
    InvalidWindow(String),
}

impl From<OpsdeskError> for InsightError {
    fn from(err: OpsdeskError) -> Self {
        match err {
            OpsdeskError::NotFound(what) => InsightError::NotFound(what),
            other => InsightError::Storage(other.to_string()),
        }
    }
}
