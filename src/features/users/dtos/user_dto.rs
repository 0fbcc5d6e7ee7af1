use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::users::models::{UserRecord, UserRole, UserStatus};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct InviteUserDto {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponseDto {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empresa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rfc: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for UserResponseDto {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            status: user.status,
            name: user.name,
            empresa: user.empresa,
            rfc: user.rfc,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invite_requires_valid_email() {
        let dto = InviteUserDto {
            email: "not-an-email".to_string(),
            role: UserRole::Reviewer,
        };
        assert!(dto.validate().is_err());

        let dto = InviteUserDto {
            email: "reviewer@example.com".to_string(),
            role: UserRole::Reviewer,
        };
        assert!(dto.validate().is_ok());
    }
}
