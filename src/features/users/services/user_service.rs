use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::Identity;
use crate::features::users::models::{NewUser, UserRecord, UserRole, UserStatus};
use crate::features::users::repositories::UserDirectory;
use crate::shared::store::StoreError;

/// Role resolution and invitation management over the user directory
pub struct UserService {
    directory: Arc<dyn UserDirectory>,
}

impl UserService {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    /// Map a token identity to its directory record.
    ///
    /// Unknown subjects claim a pending invitation for their email, or are
    /// provisioned as active requesters.
    pub async fn resolve(&self, identity: &Identity) -> Result<UserRecord> {
        if let Some(user) = self.directory.find_by_uid(&identity.sub).await? {
            return Ok(user);
        }

        let email = identity.email.as_deref().map(normalize_email).ok_or_else(|| {
            AppError::Unauthorized(
                "Account is not provisioned and the token carries no email".to_string(),
            )
        })?;

        let invitation = self
            .directory
            .find_by_email(&email)
            .await?
            .into_iter()
            .find(|u| u.status == UserStatus::Invited && u.uid.is_none());

        if let Some(invited) = invitation {
            let user = self.directory.activate(invited.id, &identity.sub).await?;
            tracing::info!(
                "Activated invitation for {} as {}",
                user.email,
                user.role
            );
            return Ok(user);
        }

        let new_user = NewUser {
            uid: Some(identity.sub.clone()),
            email,
            role: UserRole::Requester,
            status: UserStatus::Active,
        };

        match self.directory.insert(new_user).await {
            Ok(user) => {
                tracing::info!("Provisioned requester account for {}", user.email);
                Ok(user)
            }
            // A concurrent first request already provisioned this subject
            Err(StoreError::Conflict) => self
                .directory
                .find_by_uid(&identity.sub)
                .await?
                .ok_or_else(|| AppError::Internal("Provisioned user vanished".to_string())),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn invite(&self, email: &str, role: UserRole) -> Result<UserRecord> {
        let email = normalize_email(email);

        if !self.directory.find_by_email(&email).await?.is_empty() {
            return Err(AppError::Conflict(format!(
                "A user with email {} already exists",
                email
            )));
        }

        let user = self
            .directory
            .insert(NewUser {
                uid: None,
                email,
                role,
                status: UserStatus::Invited,
            })
            .await?;

        tracing::info!("Invited {} as {}", user.email, user.role);
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<UserRecord>> {
        Ok(self.directory.list().await?)
    }

    /// Remove every record with this email
    pub async fn remove(&self, email: &str) -> Result<u64> {
        let email = normalize_email(email);
        let removed = self.directory.delete_by_email(&email).await?;

        if removed == 0 {
            return Err(AppError::NotFound(format!("No user with email {}", email)));
        }

        tracing::info!("Removed {} record(s) for {}", removed, email);
        Ok(removed)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::InMemoryUserDirectory;
    use fake::{faker::internet::en::SafeEmail, Fake};

    fn service() -> (UserService, Arc<InMemoryUserDirectory>) {
        let directory = Arc::new(InMemoryUserDirectory::default());
        (UserService::new(directory.clone()), directory)
    }

    fn identity(sub: &str, email: Option<&str>) -> Identity {
        Identity {
            sub: sub.to_string(),
            email: email.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_unknown_subject_is_provisioned_as_requester() {
        let (service, _) = service();
        let email: String = SafeEmail().fake();

        let user = service.resolve(&identity("sub-1", Some(&email))).await.unwrap();

        assert_eq!(user.role, UserRole::Requester);
        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(user.uid.as_deref(), Some("sub-1"));

        // Second sign-in finds the same record
        let again = service.resolve(&identity("sub-1", Some(&email))).await.unwrap();
        assert_eq!(again.id, user.id);
    }

    #[tokio::test]
    async fn test_invitation_is_activated_with_invited_role() {
        let (service, _) = service();
        service
            .invite("Reviewer@Example.com", UserRole::Reviewer)
            .await
            .unwrap();

        let user = service
            .resolve(&identity("sub-2", Some("reviewer@example.com")))
            .await
            .unwrap();

        assert_eq!(user.role, UserRole::Reviewer);
        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(user.uid.as_deref(), Some("sub-2"));
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_subject_without_email_is_rejected() {
        let (service, _) = service();
        let result = service.resolve(&identity("sub-3", None)).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_invite_existing_email_conflicts() {
        let (service, _) = service();
        service
            .invite("someone@example.com", UserRole::Requester)
            .await
            .unwrap();

        let result = service
            .invite(" SOMEONE@example.com ", UserRole::Admin)
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_remove_deletes_every_record_for_email() {
        let (service, directory) = service();
        directory.seed("a@example.com", Some("sub-a"), UserRole::Requester);
        directory.seed("a@example.com", None, UserRole::Reviewer);
        directory.seed("b@example.com", None, UserRole::Reviewer);

        assert_eq!(service.remove("A@example.com").await.unwrap(), 2);
        assert_eq!(service.list().await.unwrap().len(), 1);

        let missing = service.remove("a@example.com").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }
}
