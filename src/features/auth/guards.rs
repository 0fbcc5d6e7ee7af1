//! Role-based authorization guards.
//!
//! These guards read the authenticated user placed in the request extensions
//! by the auth middleware and verify the required role:
//! - admin: user management and everything a reviewer can do
//! - reviewer: sees every study, drives scoring and review
//! - requester: owns and submits its own studies

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use axum::{extract::FromRequestParts, http::request::Parts};

fn authenticated(parts: &Parts) -> Result<AuthenticatedUser, AppError> {
    parts
        .extensions
        .get::<AuthenticatedUser>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))
}

/// Guard for admin-only endpoints.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireAdmin(user): RequireAdmin) { ... }
/// ```
pub struct RequireAdmin(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = authenticated(parts)?;

        if !user.is_admin() {
            return Err(AppError::NotAuthorized("Admin access required".to_string()));
        }

        Ok(RequireAdmin(user))
    }
}

/// Guard for reviewer-level endpoints. Allows reviewers and admins.
pub struct RequireReviewer(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireReviewer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = authenticated(parts)?;

        if !user.can_review() {
            return Err(AppError::NotAuthorized(
                "Reviewer access required".to_string(),
            ));
        }

        Ok(RequireReviewer(user))
    }
}
