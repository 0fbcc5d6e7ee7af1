use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::users::models::UserRole;

/// Caller identity after the bearer token was validated and the subject
/// resolved against the user directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Identity provider subject, used as the study owner uid
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Reviewer-level access (reviewer or admin)
    pub fn can_review(&self) -> bool {
        self.role.can_review()
    }
}

/// Claims read from a validated access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Identity proven by a token, before role resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub sub: String,
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_access_follows_role() {
        let mut user = AuthenticatedUser {
            sub: "u1".to_string(),
            email: None,
            role: UserRole::Requester,
        };
        assert!(!user.can_review());
        assert!(!user.is_admin());

        user.role = UserRole::Reviewer;
        assert!(user.can_review());
        assert!(!user.is_admin());

        user.role = UserRole::Admin;
        assert!(user.can_review());
        assert!(user.is_admin());
    }
}
