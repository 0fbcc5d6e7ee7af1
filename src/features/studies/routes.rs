use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use super::handlers::{
    document_handler::{remove_document, upload_document},
    lifecycle_handler::{
        active_job, approve_study, cancel_scoring, reject_study, request_reputation, reset_study,
        start_scoring, submit_study, LifecycleState,
    },
    study_handler::{
        create_study, get_study, list_studies, report_summary, save_questionnaire, StudyState,
    },
    webhook_handler::{complete_scoring, WebhookState},
};
use super::lifecycle::LifecycleController;
use super::services::{DocumentService, ReportService, StudyService};

/// Maximum body size for document uploads (21MB to account for multipart overhead)
const DOCUMENT_BODY_LIMIT: usize = 21 * 1024 * 1024;

/// Authenticated study routes
pub fn routes(
    study_service: Arc<StudyService>,
    report_service: Arc<ReportService>,
    document_service: Arc<DocumentService>,
    lifecycle: Arc<LifecycleController>,
) -> Router {
    let study_state = StudyState {
        studies: Arc::clone(&study_service),
        reports: report_service,
    };

    let lifecycle_state = LifecycleState {
        studies: study_service,
        lifecycle,
    };

    let study_routes = Router::new()
        .route("/api/studies", get(list_studies).post(create_study))
        .route("/api/studies/{id}", get(get_study))
        .route("/api/studies/{id}/questionnaire", put(save_questionnaire))
        .route("/api/studies/{id}/report", get(report_summary))
        .with_state(study_state);

    let lifecycle_routes = Router::new()
        .route("/api/studies/{id}/submit", post(submit_study))
        .route(
            "/api/studies/{id}/scoring",
            post(start_scoring).get(active_job),
        )
        .route("/api/studies/{id}/scoring/{job_id}", delete(cancel_scoring))
        .route("/api/studies/{id}/reset", post(reset_study))
        .route("/api/studies/{id}/approve", post(approve_study))
        .route("/api/studies/{id}/reject", post(reject_study))
        .route("/api/studies/{id}/reputation", post(request_reputation))
        .with_state(lifecycle_state);

    let document_routes = Router::new()
        .route(
            "/api/studies/{id}/files/{slot}",
            put(upload_document)
                .layer(DefaultBodyLimit::max(DOCUMENT_BODY_LIMIT))
                .delete(remove_document),
        )
        .with_state(document_service);

    study_routes
        .merge(lifecycle_routes)
        .merge(document_routes)
}

/// Callback routes for the scoring job; authenticated by the shared key,
/// not by a bearer token
pub fn webhook_routes(lifecycle: Arc<LifecycleController>, api_key: Option<String>) -> Router {
    let state = WebhookState {
        lifecycle,
        api_key: api_key.map(Arc::new),
    };

    Router::new()
        .route(
            "/api/webhooks/scoring/{id}/complete",
            post(complete_scoring),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ScoringConfig;
    use crate::features::studies::models::StudyStatus;
    use crate::features::studies::services::DigestReputationProvider;
    use crate::features::users::models::UserRole;
    use crate::shared::constants::SCORING_API_KEY_HEADER;
    use crate::shared::test_helpers::{
        sample_questionnaire, stored_study, with_user, FakeScoringClient, FakeStorage,
        InMemoryStudyStore, ScoringBehavior,
    };
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use std::time::Duration;

    const SCORING_KEY: &str = "scoring-secret";

    struct App {
        store: Arc<InMemoryStudyStore>,
        scoring: Arc<FakeScoringClient>,
        router: Router,
    }

    impl App {
        fn new(behavior: ScoringBehavior) -> Self {
            let store = Arc::new(InMemoryStudyStore::default());
            let scoring = Arc::new(FakeScoringClient::new(store.clone(), behavior));
            let config = ScoringConfig {
                webhook_url: "http://scoring.test/hook".to_string(),
                api_key: Some(SCORING_KEY.to_string()),
                timeout: Duration::from_secs(ScoringConfig::DEFAULT_TIMEOUT_SECS),
                strict_review: false,
            };
            let lifecycle = Arc::new(LifecycleController::new(
                store.clone(),
                scoring.clone(),
                Arc::new(DigestReputationProvider),
                &config,
            ));

            let router = routes(
                Arc::new(StudyService::new(store.clone())),
                Arc::new(ReportService::new(store.clone())),
                Arc::new(DocumentService::new(
                    store.clone(),
                    Arc::new(FakeStorage::default()),
                )),
                lifecycle.clone(),
            );
            let router = router.merge(webhook_routes(lifecycle, config.api_key));

            Self {
                store,
                scoring,
                router,
            }
        }

        fn as_user(&self, sub: &str, role: UserRole) -> TestServer {
            TestServer::new(with_user(self.router.clone(), sub, role)).unwrap()
        }
    }

    #[tokio::test]
    async fn test_requester_creates_and_lists_own_studies() {
        let app = App::new(ScoringBehavior::Ack);
        stored_study(&app.store, "someone-else", StudyStatus::Draft);
        let server = app.as_user("owner-1", UserRole::Requester);

        let response = server
            .post("/api/studies")
            .json(&json!({ "questionnaire": sample_questionnaire() }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: Value = response.json();
        assert_eq!(created["data"]["status"], "draft");
        assert_eq!(created["data"]["ownerUid"], "owner-1");
        assert_eq!(created["data"]["files"]["anexosPDF"], Value::Null);

        let listed: Value = server.get("/api/studies").await.json();
        assert_eq!(listed["meta"]["total"], 1);
    }

    #[tokio::test]
    async fn test_requester_cannot_read_foreign_study() {
        let app = App::new(ScoringBehavior::Ack);
        let id = stored_study(&app.store, "owner-2", StudyStatus::Draft)
            .id
            .unwrap();

        app.as_user("owner-1", UserRole::Requester)
            .get(&format!("/api/studies/{}", id))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_submit_with_incomplete_shareholders_is_bad_request() {
        let app = App::new(ScoringBehavior::Ack);
        let id = stored_study(&app.store, "owner-1", StudyStatus::Draft)
            .id
            .unwrap();
        let server = app.as_user("owner-1", UserRole::Requester);

        let mut questionnaire = sample_questionnaire();
        questionnaire.accionistas.pop();
        server
            .put(&format!("/api/studies/{}/questionnaire", id))
            .json(&questionnaire)
            .await
            .assert_status_ok();

        server
            .post(&format!("/api/studies/{}/submit", id))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(app.store.status_of(id), Some(StudyStatus::Draft));
    }

    #[tokio::test]
    async fn test_start_scoring_acknowledged() {
        let app = App::new(ScoringBehavior::Ack);
        let id = stored_study(&app.store, "owner-1", StudyStatus::Uploaded)
            .id
            .unwrap();

        let response = app
            .as_user("reviewer-1", UserRole::Reviewer)
            .post(&format!("/api/studies/{}/scoring", id))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["status"], "processing");
        assert_eq!(body["data"]["studyId"], id.to_string());
        assert_eq!(app.scoring.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_scoring_is_bad_gateway_and_rolls_back() {
        let app = App::new(ScoringBehavior::Status(500));
        let id = stored_study(&app.store, "owner-1", StudyStatus::Uploaded)
            .id
            .unwrap();

        app.as_user("reviewer-1", UserRole::Reviewer)
            .post(&format!("/api/studies/{}/scoring", id))
            .await
            .assert_status(StatusCode::BAD_GATEWAY);
        assert_eq!(app.store.status_of(id), Some(StudyStatus::Draft));
    }

    #[tokio::test]
    async fn test_requester_cannot_start_scoring() {
        let app = App::new(ScoringBehavior::Ack);
        let id = stored_study(&app.store, "owner-1", StudyStatus::Uploaded)
            .id
            .unwrap();

        app.as_user("owner-1", UserRole::Requester)
            .post(&format!("/api/studies/{}/scoring", id))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        assert!(app.scoring.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_without_active_job_reverts_to_draft() {
        let app = App::new(ScoringBehavior::Ack);
        let id = stored_study(&app.store, "owner-1", StudyStatus::Processing)
            .id
            .unwrap();

        let response = app
            .as_user("reviewer-1", UserRole::Reviewer)
            .delete(&format!("/api/studies/{}/scoring/{}", id, uuid::Uuid::new_v4()))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["status"], "draft");

        // Persisted in the background
        for _ in 0..50 {
            if app.store.status_of(id) == Some(StudyStatus::Draft) {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("cancellation never persisted");
    }

    #[tokio::test]
    async fn test_reset_outside_processing_is_conflict() {
        let app = App::new(ScoringBehavior::Ack);
        let id = stored_study(&app.store, "owner-1", StudyStatus::Approved)
            .id
            .unwrap();

        let response = app
            .as_user("admin-1", UserRole::Admin)
            .post(&format!("/api/studies/{}/reset", id))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert!(body["message"].as_str().unwrap().contains("approved"));
    }

    #[tokio::test]
    async fn test_webhook_requires_scoring_key() {
        let app = App::new(ScoringBehavior::Ack);
        let id = stored_study(&app.store, "owner-1", StudyStatus::Processing)
            .id
            .unwrap();
        let server = TestServer::new(app.router.clone()).unwrap();
        let path = format!("/api/webhooks/scoring/{}/complete", id);

        server
            .post(&path)
            .json(&json!({ "riskScore": 77.5 }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let response = server
            .post(&path)
            .add_header(SCORING_API_KEY_HEADER, SCORING_KEY)
            .json(&json!({ "riskScore": 77.5 }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["status"], "pending_review");
        assert_eq!(body["data"]["analysisData"]["riskScore"], 77.5);
    }

    #[tokio::test]
    async fn test_report_after_scoring() {
        let app = App::new(ScoringBehavior::Ack);
        let id = stored_study(&app.store, "owner-1", StudyStatus::Processing)
            .id
            .unwrap();
        let path = format!("/api/studies/{}/report", id);
        let owner = app.as_user("owner-1", UserRole::Requester);

        owner.get(&path).await.assert_status(StatusCode::CONFLICT);

        TestServer::new(app.router.clone())
            .unwrap()
            .post(&format!("/api/webhooks/scoring/{}/complete", id))
            .add_header(SCORING_API_KEY_HEADER, SCORING_KEY)
            .json(&json!({ "riskScore": 45.0 }))
            .await
            .assert_status_ok();

        let body: Value = owner.get(&path).await.json();
        assert_eq!(body["data"]["riskBand"], "high");
        assert_eq!(body["data"]["recommendation"], "review_with_caution");
    }

    #[tokio::test]
    async fn test_upload_and_remove_document() {
        let app = App::new(ScoringBehavior::Ack);
        let id = stored_study(&app.store, "owner-1", StudyStatus::Draft)
            .id
            .unwrap();
        let server = app.as_user("owner-1", UserRole::Requester);
        let path = format!("/api/studies/{}/files/anexosPDF", id);

        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(b"%PDF-1.7".to_vec())
                .file_name("anexo.pdf")
                .mime_type("application/pdf"),
        );
        let response = server.put(&path).multipart(form).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(
            body["data"]["files"]["anexosPDF"],
            format!("memory://studies/{}/anexosPDF-anexo.pdf", id)
        );

        let body: Value = server.delete(&path).await.json();
        assert_eq!(body["data"]["files"]["anexosPDF"], Value::Null);
    }

    #[tokio::test]
    async fn test_approve_requires_reviewer() {
        let app = App::new(ScoringBehavior::Ack);
        let id = stored_study(&app.store, "owner-1", StudyStatus::PendingReview)
            .id
            .unwrap();
        let path = format!("/api/studies/{}/approve", id);

        app.as_user("owner-1", UserRole::Requester)
            .post(&path)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let body: Value = app
            .as_user("reviewer-1", UserRole::Reviewer)
            .post(&path)
            .await
            .json();
        assert_eq!(body["data"]["status"], "approved");
    }
}
