use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use super::{next_updated_at, StudyStore};
use crate::features::studies::models::{
    Study, StudyDocument, StudyFilter, StudyPatch, StudyStatus,
};
use crate::shared::store::StoreError;

const STUDY_COLUMNS: &str = "id, owner_uid, status, created_at, updated_at, document";

#[derive(Debug, FromRow)]
struct StudyRow {
    id: Uuid,
    owner_uid: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    document: Json<Value>,
}

impl TryFrom<StudyRow> for Study {
    type Error = StoreError;

    fn try_from(row: StudyRow) -> Result<Self, Self::Error> {
        let document: StudyDocument = serde_json::from_value(row.document.0)
            .map_err(|e| StoreError::Corrupt(format!("study {}: {}", row.id, e)))?;

        Ok(Study {
            id: Some(row.id),
            owner_uid: row.owner_uid,
            status: row.status.parse().map_err(StoreError::Corrupt)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            document,
        })
    }
}

fn document_value(document: &StudyDocument) -> Result<Value, StoreError> {
    serde_json::to_value(document).map_err(|e| StoreError::Corrupt(e.to_string()))
}

/// Postgres-backed study store. The document body lives in a JSONB column;
/// status and timestamps are columns so status writes can be guarded.
pub struct PgStudyStore {
    pool: PgPool,
}

impl PgStudyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Read-modify-write of one study under a row lock
    async fn merge_guarded(
        &self,
        id: Uuid,
        expected: Option<&[StudyStatus]>,
        patch: StudyPatch,
    ) -> Result<Option<Study>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, StudyRow>(&format!(
            "SELECT {STUDY_COLUMNS} FROM studies WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound)?;

        let current_status: StudyStatus = current.status.parse().map_err(StoreError::Corrupt)?;
        if let Some(expected) = expected {
            if !expected.contains(&current_status) {
                tx.rollback().await?;
                return Ok(None);
            }
        }

        let mut document = current.document.0;
        patch.apply_to(&mut document);

        // Reject writes that would leave an unreadable document behind
        serde_json::from_value::<StudyDocument>(document.clone())
            .map_err(|e| StoreError::Corrupt(format!("patch on study {}: {}", id, e)))?;

        let status = patch.status.unwrap_or(current_status);

        let row = sqlx::query_as::<_, StudyRow>(&format!(
            r#"
            UPDATE studies
            SET status = $2, updated_at = $3, document = $4
            WHERE id = $1
            RETURNING {STUDY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(next_updated_at(current.updated_at))
        .bind(Json(document))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Study::try_from(row).map(Some)
    }
}

#[async_trait]
impl StudyStore for PgStudyStore {
    async fn get(&self, id: Uuid) -> Result<Study, StoreError> {
        let row = sqlx::query_as::<_, StudyRow>(&format!(
            "SELECT {STUDY_COLUMNS} FROM studies WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch study {}: {:?}", id, e);
            StoreError::from(e)
        })?
        .ok_or(StoreError::NotFound)?;

        Study::try_from(row)
    }

    async fn create(&self, study: &Study) -> Result<Study, StoreError> {
        let row = sqlx::query_as::<_, StudyRow>(&format!(
            r#"
            INSERT INTO studies (owner_uid, status, created_at, updated_at, document)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {STUDY_COLUMNS}
            "#
        ))
        .bind(&study.owner_uid)
        .bind(study.status.as_str())
        .bind(study.created_at)
        .bind(study.updated_at)
        .bind(Json(document_value(&study.document)?))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create study: {:?}", e);
            StoreError::from(e)
        })?;

        Study::try_from(row)
    }

    async fn merge(&self, id: Uuid, patch: StudyPatch) -> Result<Study, StoreError> {
        self.merge_guarded(id, None, patch)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update study {}: {:?}", id, e);
                e
            })?
            .ok_or(StoreError::NotFound)
    }

    async fn merge_if_status(
        &self,
        id: Uuid,
        expected: &[StudyStatus],
        patch: StudyPatch,
    ) -> Result<Option<Study>, StoreError> {
        self.merge_guarded(id, Some(expected), patch)
            .await
            .map_err(|e| {
                tracing::error!("Failed guarded update of study {}: {:?}", id, e);
                e
            })
    }

    async fn query(&self, filter: StudyFilter) -> Result<Vec<Study>, StoreError> {
        let rows = match filter {
            StudyFilter::All => {
                sqlx::query_as::<_, StudyRow>(&format!(
                    "SELECT {STUDY_COLUMNS} FROM studies ORDER BY created_at DESC"
                ))
                .fetch_all(&self.pool)
                .await
            }
            StudyFilter::OwnedBy(owner_uid) => {
                sqlx::query_as::<_, StudyRow>(&format!(
                    "SELECT {STUDY_COLUMNS} FROM studies WHERE owner_uid = $1 ORDER BY created_at DESC"
                ))
                .bind(owner_uid)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| {
            tracing::error!("Failed to query studies: {:?}", e);
            StoreError::from(e)
        })?;

        rows.into_iter().map(Study::try_from).collect()
    }
}
