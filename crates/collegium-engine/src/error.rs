//! Engine error types.

use collegium_core::error::CollegiumError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The store rejected an operation or it timed out mid-flight.
    /// Retry policy belongs to the caller; the engine never retries.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// The caller named a specific request that does not exist.
    #[error("transition request not found: {0}")]
    RequestNotFound(Uuid),
}

impl From<CollegiumError> for EngineError {
    fn from(err: CollegiumError) -> Self {
        EngineError::Persistence(err.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
