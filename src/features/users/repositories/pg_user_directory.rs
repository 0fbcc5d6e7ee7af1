use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::UserDirectory;
use crate::features::users::models::{NewUser, UserRecord};
use crate::shared::store::StoreError;

const USER_COLUMNS: &str = "id, uid, email, role, status, name, empresa, rfc, created_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    uid: Option<String>,
    email: String,
    role: String,
    status: String,
    name: Option<String>,
    empresa: Option<String>,
    rfc: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(UserRecord {
            id: row.id,
            uid: row.uid,
            email: row.email,
            role: row.role.parse().map_err(StoreError::Corrupt)?,
            status: row.status.parse().map_err(StoreError::Corrupt)?,
            name: row.name,
            empresa: row.empresa,
            rfc: row.rfc,
            created_at: row.created_at,
        })
    }
}

fn into_records(rows: Vec<UserRow>) -> Result<Vec<UserRecord>, StoreError> {
    rows.into_iter().map(UserRecord::try_from).collect()
}

/// Postgres-backed user directory
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_uid(&self, uid: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE uid = $1"
        ))
        .bind(uid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to look up user by uid: {:?}", e);
            StoreError::from(e)
        })?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<UserRecord>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1) ORDER BY created_at"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to look up user by email: {:?}", e);
            StoreError::from(e)
        })?;

        into_records(rows)
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (uid, email, role, status)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.uid)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert user: {:?}", e);
            StoreError::from(e)
        })?;

        UserRecord::try_from(row)
    }

    async fn activate(&self, id: Uuid, uid: &str) -> Result<UserRecord, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET uid = $2, status = 'active'
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(uid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to activate user {}: {:?}", id, e);
            StoreError::from(e)
        })?
        .ok_or(StoreError::NotFound)?;

        UserRecord::try_from(row)
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list users: {:?}", e);
            StoreError::from(e)
        })?;

        into_records(rows)
    }

    async fn delete_by_email(&self, email: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete users by email: {:?}", e);
                StoreError::from(e)
            })?;

        Ok(result.rows_affected())
    }
}
