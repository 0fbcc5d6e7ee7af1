mod pg_user_directory;

pub use pg_user_directory::PgUserDirectory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::features::users::models::{NewUser, UserRecord};
use crate::shared::store::StoreError;

/// User directory collaborator. Emails are compared case-insensitively.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_uid(&self, uid: &str) -> Result<Option<UserRecord>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Vec<UserRecord>, StoreError>;
    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError>;
    /// Bind `uid` to an invited entry and mark it active
    async fn activate(&self, id: Uuid, uid: &str) -> Result<UserRecord, StoreError>;
    async fn list(&self) -> Result<Vec<UserRecord>, StoreError>;
    /// Returns the number of removed entries
    async fn delete_by_email(&self, email: &str) -> Result<u64, StoreError>;
}
