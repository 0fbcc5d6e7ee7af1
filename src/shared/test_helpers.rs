//! In-memory collaborators and fixtures shared by unit and router tests.

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, Router};
use chrono::Utc;
use fake::{faker::company::en::CompanyName, Fake};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::{AuthenticatedUser, Identity};
use crate::features::auth::TokenVerifier;
use crate::features::studies::models::{
    Accionista, DatosGenerales, Questionnaire, ReputationData, Study, StudyDocument,
    StudyFilter, StudyPatch, StudyStatus,
};
use crate::features::studies::repositories::{next_updated_at, StudyStore};
use crate::features::studies::services::ReputationProvider;
use crate::features::users::models::{NewUser, UserRecord, UserRole, UserStatus};
use crate::features::users::repositories::UserDirectory;
use crate::modules::scoring::{ScoringCallError, ScoringJobClient, ScoringJobPayload};
use crate::modules::storage::{ObjectStorage, StorageError};
use crate::shared::store::StoreError;

// =============================================================================
// AUTH
// =============================================================================

pub fn test_user(sub: &str, role: UserRole) -> AuthenticatedUser {
    AuthenticatedUser {
        sub: sub.to_string(),
        email: Some(format!("{}@example.com", sub)),
        role,
    }
}

/// Wrap a router so every request is made by `sub` with `role`
pub fn with_user(router: Router, sub: &str, role: UserRole) -> Router {
    let user = test_user(sub, role);
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let user = user.clone();
            async move {
                request.extensions_mut().insert(user);
                next.run(request).await
            }
        },
    ))
}

/// Accepts tokens of the form `sub|email` (email optional)
pub struct StaticTokenVerifier;

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Identity> {
        let mut parts = token.splitn(2, '|');
        let sub = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Auth("empty token".to_string()))?;
        Ok(Identity {
            sub: sub.to_string(),
            email: parts.next().map(str::to_string),
        })
    }
}

// =============================================================================
// USER DIRECTORY
// =============================================================================

#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: Mutex<Vec<UserRecord>>,
}

impl InMemoryUserDirectory {
    /// Insert a record directly; active when a uid is given, invited otherwise
    pub fn seed(&self, email: &str, uid: Option<&str>, role: UserRole) -> UserRecord {
        let user = UserRecord {
            id: Uuid::new_v4(),
            uid: uid.map(str::to_string),
            email: email.to_string(),
            role,
            status: if uid.is_some() {
                UserStatus::Active
            } else {
                UserStatus::Invited
            },
            name: None,
            empresa: None,
            rfc: None,
            created_at: Utc::now(),
        };
        self.users.lock().unwrap().push(user.clone());
        user
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_uid(&self, uid: &str) -> std::result::Result<Option<UserRecord>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.uid.as_deref() == Some(uid)).cloned())
    }

    async fn find_by_email(&self, email: &str) -> std::result::Result<Vec<UserRecord>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .filter(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
            .collect())
    }

    async fn insert(&self, user: NewUser) -> std::result::Result<UserRecord, StoreError> {
        let mut users = self.users.lock().unwrap();
        if let Some(uid) = &user.uid {
            if users.iter().any(|u| u.uid.as_ref() == Some(uid)) {
                return Err(StoreError::Conflict);
            }
        }
        let record = UserRecord {
            id: Uuid::new_v4(),
            uid: user.uid,
            email: user.email,
            role: user.role,
            status: user.status,
            name: None,
            empresa: None,
            rfc: None,
            created_at: Utc::now(),
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn activate(&self, id: Uuid, uid: &str) -> std::result::Result<UserRecord, StoreError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;
        user.uid = Some(uid.to_string());
        user.status = UserStatus::Active;
        Ok(user.clone())
    }

    async fn list(&self) -> std::result::Result<Vec<UserRecord>, StoreError> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn delete_by_email(&self, email: &str) -> std::result::Result<u64, StoreError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| !u.email.eq_ignore_ascii_case(email));
        Ok((before - users.len()) as u64)
    }
}

// =============================================================================
// STUDY STORE
// =============================================================================

/// Study store over a map. Writes can be made to fail to simulate an
/// unreachable database.
#[derive(Default)]
pub struct InMemoryStudyStore {
    studies: Mutex<HashMap<Uuid, Study>>,
    fail_writes: AtomicBool,
}

impl InMemoryStudyStore {
    pub fn insert(&self, study: Study) -> Study {
        let mut study = study;
        let id = *study.id.get_or_insert_with(Uuid::new_v4);
        self.studies.lock().unwrap().insert(id, study.clone());
        study
    }

    pub fn status_of(&self, id: Uuid) -> Option<StudyStatus> {
        self.studies.lock().unwrap().get(&id).map(|s| s.status)
    }

    pub fn snapshot(&self, id: Uuid) -> Option<Study> {
        self.studies.lock().unwrap().get(&id).cloned()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> std::result::Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("store is offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn apply(study: &mut Study, patch: &StudyPatch) -> std::result::Result<(), StoreError> {
        let mut document = serde_json::to_value(&study.document)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        patch.apply_to(&mut document);
        study.document = serde_json::from_value::<StudyDocument>(document)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        if let Some(status) = patch.status {
            study.status = status;
        }
        study.updated_at = next_updated_at(study.updated_at);
        Ok(())
    }
}

#[async_trait]
impl StudyStore for InMemoryStudyStore {
    async fn get(&self, id: Uuid) -> std::result::Result<Study, StoreError> {
        self.snapshot(id).ok_or(StoreError::NotFound)
    }

    async fn create(&self, study: &Study) -> std::result::Result<Study, StoreError> {
        self.check_writable()?;
        let mut study = study.clone();
        study.id = Some(Uuid::new_v4());
        Ok(self.insert(study))
    }

    async fn merge(&self, id: Uuid, patch: StudyPatch) -> std::result::Result<Study, StoreError> {
        self.check_writable()?;
        let mut studies = self.studies.lock().unwrap();
        let study = studies.get_mut(&id).ok_or(StoreError::NotFound)?;
        Self::apply(study, &patch)?;
        Ok(study.clone())
    }

    async fn merge_if_status(
        &self,
        id: Uuid,
        expected: &[StudyStatus],
        patch: StudyPatch,
    ) -> std::result::Result<Option<Study>, StoreError> {
        self.check_writable()?;
        let mut studies = self.studies.lock().unwrap();
        let study = studies.get_mut(&id).ok_or(StoreError::NotFound)?;
        if !expected.contains(&study.status) {
            return Ok(None);
        }
        Self::apply(study, &patch)?;
        Ok(Some(study.clone()))
    }

    async fn query(&self, filter: StudyFilter) -> std::result::Result<Vec<Study>, StoreError> {
        let studies = self.studies.lock().unwrap();
        Ok(studies
            .values()
            .filter(|s| match &filter {
                StudyFilter::All => true,
                StudyFilter::OwnedBy(uid) => &s.owner_uid == uid,
            })
            .cloned()
            .collect())
    }
}

// =============================================================================
// SCORING JOB
// =============================================================================

/// How the fake scoring endpoint answers
#[derive(Debug, Clone)]
pub enum ScoringBehavior {
    Ack,
    Status(u16),
    Unreachable,
    /// Answer with `Ack` after the delay
    Slow(Duration),
    Hang,
}

/// Fake scoring endpoint that records the stored study status at the
/// moment each call is issued.
pub struct FakeScoringClient {
    store: Arc<InMemoryStudyStore>,
    behavior: Mutex<ScoringBehavior>,
    calls: Mutex<Vec<(ScoringJobPayload, Option<StudyStatus>)>>,
}

impl FakeScoringClient {
    pub fn new(store: Arc<InMemoryStudyStore>, behavior: ScoringBehavior) -> Self {
        Self {
            store,
            behavior: Mutex::new(behavior),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_behavior(&self, behavior: ScoringBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> Vec<(ScoringJobPayload, Option<StudyStatus>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScoringJobClient for FakeScoringClient {
    async fn submit(&self, payload: &ScoringJobPayload) -> std::result::Result<(), ScoringCallError> {
        let observed = self.store.status_of(payload.app_id);
        self.calls.lock().unwrap().push((payload.clone(), observed));

        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            ScoringBehavior::Ack => Ok(()),
            ScoringBehavior::Status(code) => Err(ScoringCallError::Status(code)),
            ScoringBehavior::Unreachable => {
                Err(ScoringCallError::Transport("connection refused".to_string()))
            }
            ScoringBehavior::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            ScoringBehavior::Hang => std::future::pending().await,
        }
    }
}

// =============================================================================
// REPUTATION
// =============================================================================

pub struct FailingReputationProvider;

#[async_trait]
impl ReputationProvider for FailingReputationProvider {
    async fn analyze(&self, _study: &Study) -> Result<ReputationData> {
        Err(AppError::ExternalCallFailed("reputation scan down".to_string()))
    }
}

// =============================================================================
// OBJECT STORAGE
// =============================================================================

#[derive(Default)]
pub struct FakeStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    deleted: Mutex<Vec<String>>,
}

impl FakeStorage {
    pub fn locator(path: &str) -> String {
        format!("memory://{}", path)
    }

    pub fn contains(&self, locator: &str) -> bool {
        self.objects.lock().unwrap().contains_key(locator)
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn put(
        &self,
        path: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> std::result::Result<String, StorageError> {
        let locator = Self::locator(path);
        self.objects.lock().unwrap().insert(locator.clone(), data);
        Ok(locator)
    }

    async fn delete(&self, locator: &str) -> std::result::Result<(), StorageError> {
        // Missing objects are not an error
        self.objects.lock().unwrap().remove(locator);
        self.deleted.lock().unwrap().push(locator.to_string());
        Ok(())
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

/// Questionnaire with a fake company and shareholders totalling 100%
pub fn sample_questionnaire() -> Questionnaire {
    Questionnaire {
        datos_generales: DatosGenerales {
            nombre_empresa: CompanyName().fake(),
            rfc: "ACM200101AB1".to_string(),
            sector: "INDUSTRIAL".to_string(),
        },
        accionistas: vec![
            Accionista {
                id: "1".to_string(),
                nombre: "Socio A".to_string(),
                participacion: 60.0,
            },
            Accionista {
                id: "2".to_string(),
                nombre: "Socio B".to_string(),
                participacion: 40.0,
            },
        ],
        ..Default::default()
    }
}

/// Persisted study owned by `owner` in `status`
pub fn stored_study(store: &InMemoryStudyStore, owner: &str, status: StudyStatus) -> Study {
    let mut study = Study::draft(owner);
    let questionnaire = sample_questionnaire();
    study.document.empresa_nombre = questionnaire.datos_generales.nombre_empresa.clone();
    study.document.rfc = questionnaire.datos_generales.rfc.clone();
    study.document.giro = questionnaire.datos_generales.sector.clone();
    study.document.questionnaire = questionnaire;
    study.status = status;
    store.insert(study)
}
