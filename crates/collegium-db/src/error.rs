//! Database-specific error types and conversions.

use collegium_core::error::CollegiumError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Conflict on {entity}: {reason}")]
    Conflict { entity: String, reason: String },
}

impl From<DbError> for CollegiumError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CollegiumError::NotFound { entity, id },
            DbError::Conflict { entity, .. } => CollegiumError::AlreadyExists { entity },
            other => CollegiumError::Database(other.to_string()),
        }
    }
}
