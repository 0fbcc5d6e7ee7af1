//! Object storage for study documents
//!
//! Provides the `ObjectStorage` collaborator and its MinIO/S3-compatible
//! implementation.

mod minio_client;

pub use minio_client::MinIOClient;

use async_trait::async_trait;

use crate::core::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("locator does not belong to this storage: {0}")]
    ForeignLocator(String),

    #[error("{0}")]
    Failed(String),
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::ForeignLocator(locator) => {
                AppError::BadRequest(format!("Unknown document locator: {}", locator))
            }
            StorageError::Failed(msg) => AppError::Storage(msg),
        }
    }
}

/// Byte store addressed by path. `put` returns a locator that `delete`
/// accepts; deleting a missing object succeeds.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(&self, path: &str, data: Vec<u8>, content_type: &str)
        -> Result<String, StorageError>;

    async fn delete(&self, locator: &str) -> Result<(), StorageError>;
}
