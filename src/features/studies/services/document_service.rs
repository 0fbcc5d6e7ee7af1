use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::studies::models::{FieldPath, Study, StudyPatch};
use crate::features::studies::repositories::StudyStore;
use crate::modules::storage::ObjectStorage;
use crate::shared::constants::{ALLOWED_DOCUMENT_MIME_TYPES, MAX_DOCUMENT_SIZE};

/// One uploaded file, as read from the multipart body
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Stores study documents and records their locators in `files.<slot>`
pub struct DocumentService {
    store: Arc<dyn StudyStore>,
    storage: Arc<dyn ObjectStorage>,
}

impl DocumentService {
    pub fn new(store: Arc<dyn StudyStore>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { store, storage }
    }

    /// Upload a document into `slot`, replacing whatever was there.
    ///
    /// Only `files.<slot>` is written; other slots and fields are untouched.
    pub async fn upload(
        &self,
        user: &AuthenticatedUser,
        study_id: Uuid,
        slot: &str,
        upload: DocumentUpload,
    ) -> Result<Study> {
        let path = FieldPath::document_slot(slot).map_err(AppError::Validation)?;
        validate_upload(&upload)?;

        let study = self.visible_study(user, study_id).await?;
        let previous = study.document.files.get(slot).cloned().flatten();

        let object_path = format!(
            "studies/{}/{}-{}",
            study_id,
            slot,
            urlencoding::encode(upload.file_name.trim())
        );
        let size = upload.bytes.len();
        let locator = self
            .storage
            .put(&object_path, upload.bytes, &upload.content_type)
            .await?;
        debug!("Document stored at {}", locator);

        let study = self
            .store
            .merge(
                study_id,
                StudyPatch::default().set(path, Value::String(locator.clone())),
            )
            .await?;

        info!(
            "Document '{}' ({} bytes) attached to study {} slot {} by {}",
            upload.file_name, size, study_id, slot, user.sub
        );

        if let Some(previous) = previous.filter(|p| *p != locator) {
            if let Err(e) = self.storage.delete(&previous).await {
                warn!("Failed to delete replaced document {}: {}", previous, e);
            }
        }

        Ok(study)
    }

    /// Delete the document in `slot` and clear the slot
    pub async fn remove(&self, user: &AuthenticatedUser, study_id: Uuid, slot: &str) -> Result<Study> {
        let path = FieldPath::document_slot(slot).map_err(AppError::Validation)?;
        let study = self.visible_study(user, study_id).await?;

        if let Some(locator) = study.document.files.get(slot).cloned().flatten() {
            if let Err(e) = self.storage.delete(&locator).await {
                warn!("Failed to delete document {}: {}", locator, e);
            }
        }

        let study = self
            .store
            .merge(study_id, StudyPatch::default().set(path, Value::Null))
            .await?;

        info!("Document slot {} of study {} cleared by {}", slot, study_id, user.sub);
        Ok(study)
    }

    async fn visible_study(&self, user: &AuthenticatedUser, study_id: Uuid) -> Result<Study> {
        let study = self.store.get(study_id).await?;
        if !study.is_visible_to(user) {
            return Err(AppError::NotAuthorized(
                "You do not have access to this study".to_string(),
            ));
        }
        Ok(study)
    }
}

fn validate_upload(upload: &DocumentUpload) -> Result<()> {
    if upload.bytes.is_empty() {
        return Err(AppError::Validation("Document is empty".to_string()));
    }

    if upload.bytes.len() > MAX_DOCUMENT_SIZE {
        return Err(AppError::Validation(format!(
            "Document exceeds maximum size of {} MB",
            MAX_DOCUMENT_SIZE / 1024 / 1024
        )));
    }

    let content_type = upload
        .content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    if !ALLOWED_DOCUMENT_MIME_TYPES.contains(&content_type.as_str()) {
        return Err(AppError::Validation(format!(
            "Document type '{}' is not allowed",
            upload.content_type
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::studies::models::StudyStatus;
    use crate::features::users::models::UserRole;
    use crate::shared::test_helpers::{stored_study, test_user, FakeStorage, InMemoryStudyStore};

    struct Harness {
        store: Arc<InMemoryStudyStore>,
        storage: Arc<FakeStorage>,
        service: DocumentService,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryStudyStore::default());
        let storage = Arc::new(FakeStorage::default());
        let service = DocumentService::new(store.clone(), storage.clone());
        Harness {
            store,
            storage,
            service,
        }
    }

    fn pdf(name: &str) -> DocumentUpload {
        DocumentUpload {
            file_name: name.to_string(),
            content_type: "application/pdf".to_string(),
            bytes: b"%PDF-1.7".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_upload_sets_only_its_slot() {
        let h = harness();
        let owner = test_user("owner-1", UserRole::Requester);
        let id = stored_study(&h.store, "owner-1", StudyStatus::Draft).id.unwrap();

        let study = h
            .service
            .upload(&owner, id, "anexosPDF", pdf("anexo final.pdf"))
            .await
            .unwrap();

        let expected = FakeStorage::locator(&format!("studies/{}/anexosPDF-anexo%20final.pdf", id));
        assert_eq!(study.document.files.get("anexosPDF"), Some(&Some(expected.clone())));
        assert!(h.storage.contains(&expected));
        assert_eq!(
            study.document.files.get("estadosFinancierosAnual1"),
            Some(&None)
        );
        assert_eq!(study.status, StudyStatus::Draft);
    }

    #[tokio::test]
    async fn test_upload_to_custom_slot_adds_it() {
        let h = harness();
        let owner = test_user("owner-1", UserRole::Requester);
        let id = stored_study(&h.store, "owner-1", StudyStatus::Draft).id.unwrap();

        let study = h
            .service
            .upload(&owner, id, "actaConstitutiva", pdf("acta.pdf"))
            .await
            .unwrap();

        assert_eq!(study.document.files.len(), 8);
    }

    #[tokio::test]
    async fn test_replacing_a_document_deletes_the_old_object() {
        let h = harness();
        let owner = test_user("owner-1", UserRole::Requester);
        let id = stored_study(&h.store, "owner-1", StudyStatus::Draft).id.unwrap();

        let first = h
            .service
            .upload(&owner, id, "anexosPDF", pdf("v1.pdf"))
            .await
            .unwrap();
        let old = first.document.files["anexosPDF"].clone().unwrap();

        h.service
            .upload(&owner, id, "anexosPDF", pdf("v2.pdf"))
            .await
            .unwrap();

        assert_eq!(h.storage.deleted(), vec![old.clone()]);
        assert!(!h.storage.contains(&old));
    }

    #[tokio::test]
    async fn test_upload_rejects_bad_slot_type_and_size() {
        let h = harness();
        let owner = test_user("owner-1", UserRole::Requester);
        let id = stored_study(&h.store, "owner-1", StudyStatus::Draft).id.unwrap();

        let err = h
            .service
            .upload(&owner, id, "files.x", pdf("a.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut exe = pdf("a.exe");
        exe.content_type = "application/x-msdownload".to_string();
        assert!(matches!(
            h.service.upload(&owner, id, "anexosPDF", exe).await,
            Err(AppError::Validation(_))
        ));

        let mut huge = pdf("big.pdf");
        huge.bytes = vec![0; MAX_DOCUMENT_SIZE + 1];
        assert!(matches!(
            h.service.upload(&owner, id, "anexosPDF", huge).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_clears_slot_and_deletes_object() {
        let h = harness();
        let owner = test_user("owner-1", UserRole::Requester);
        let id = stored_study(&h.store, "owner-1", StudyStatus::Draft).id.unwrap();
        let uploaded = h
            .service
            .upload(&owner, id, "anexosPDF", pdf("a.pdf"))
            .await
            .unwrap();
        let locator = uploaded.document.files["anexosPDF"].clone().unwrap();

        let study = h.service.remove(&owner, id, "anexosPDF").await.unwrap();

        assert_eq!(study.document.files.get("anexosPDF"), Some(&None));
        assert_eq!(h.storage.deleted(), vec![locator]);
    }

    #[tokio::test]
    async fn test_foreign_requester_cannot_upload() {
        let h = harness();
        let id = stored_study(&h.store, "owner-2", StudyStatus::Draft).id.unwrap();

        let err = h
            .service
            .upload(
                &test_user("owner-1", UserRole::Requester),
                id,
                "anexosPDF",
                pdf("a.pdf"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotAuthorized(_)));
        assert!(h.storage.deleted().is_empty());
    }
}
