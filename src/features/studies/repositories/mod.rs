mod pg_study_store;

pub use pg_study_store::PgStudyStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::features::studies::models::{Study, StudyFilter, StudyPatch, StudyStatus};
use crate::shared::store::StoreError;

/// Document store holding studies, keyed by id. Writes are last-write-wins
/// per study; nothing spans two studies.
#[async_trait]
pub trait StudyStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Study, StoreError>;

    /// Persist a new study and return it with its assigned id
    async fn create(&self, study: &Study) -> Result<Study, StoreError>;

    /// Apply a partial update and return the updated study
    async fn merge(&self, id: Uuid, patch: StudyPatch) -> Result<Study, StoreError>;

    /// Apply a partial update only while the stored status is one of
    /// `expected`. Returns `None` when the status did not match.
    async fn merge_if_status(
        &self,
        id: Uuid,
        expected: &[StudyStatus],
        patch: StudyPatch,
    ) -> Result<Option<Study>, StoreError>;

    async fn query(&self, filter: StudyFilter) -> Result<Vec<Study>, StoreError>;
}

/// Next `updatedAt` for a mutation; never moves backwards
pub(crate) fn next_updated_at(previous: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(previous)
}
