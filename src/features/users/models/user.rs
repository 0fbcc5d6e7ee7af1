use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::shared::constants::{ROLE_ADMIN, ROLE_REQUESTER, ROLE_REVIEWER};

/// Role held by a user of the credit desk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Reviewer,
    Requester,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => ROLE_ADMIN,
            UserRole::Reviewer => ROLE_REVIEWER,
            UserRole::Requester => ROLE_REQUESTER,
        }
    }

    /// Reviewers and admins see every study and drive its review
    pub fn can_review(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Reviewer)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_ADMIN => Ok(UserRole::Admin),
            ROLE_REVIEWER => Ok(UserRole::Reviewer),
            ROLE_REQUESTER => Ok(UserRole::Requester),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Invited,
    Active,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Invited => "invited",
            UserStatus::Active => "active",
        }
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invited" => Ok(UserStatus::Invited),
            "active" => Ok(UserStatus::Active),
            other => Err(format!("unknown user status '{}'", other)),
        }
    }
}

/// Directory entry; `uid` is bound on first sign-in for invited users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Uuid,
    pub uid: Option<String>,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub name: Option<String>,
    pub empresa: Option<String>,
    pub rfc: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Data for inserting a directory entry
#[derive(Debug, Clone)]
pub struct NewUser {
    pub uid: Option<String>,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
}
