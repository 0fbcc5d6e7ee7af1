use crate::core::error::AppError;

/// Failure reported by a persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    Conflict,
    #[error("stored record is invalid: {0}")]
    Corrupt(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::Conflict,
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => AppError::NotFound("Record not found".to_string()),
            StoreError::Conflict => AppError::Conflict("Record already exists".to_string()),
            StoreError::Corrupt(msg) => AppError::Internal(msg),
            StoreError::Unavailable(msg) => AppError::PersistenceUnavailable(msg),
        }
    }
}
