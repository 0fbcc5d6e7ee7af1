use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::jobs::{CancelOutcome, CancelSignal, JobHandle, JobRegistry};
use super::state_machine::{authorize, Actor, InvalidTransition, StudyAction};
use crate::core::config::ScoringConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::studies::models::{AnalysisData, FieldPath, Study, StudyPatch, StudyStatus};
use crate::features::studies::repositories::StudyStore;
use crate::features::studies::services::ReputationProvider;
use crate::modules::scoring::{ScoringJobClient, ScoringJobPayload};

/// A scoring job that was started. The study is already `Processing`.
pub struct StartedJob {
    pub handle: JobHandle,
    pub study: Study,
    outcome: JoinHandle<Result<()>>,
}

impl StartedJob {
    /// Wait for the external call to resolve.
    ///
    /// `ExternalCallFailed` means the study was rolled back to `Draft`;
    /// `ExternalCallCancelled` means the wait ended (timeout or cancel) and the
    /// status was left to whoever ended it.
    pub async fn outcome(self) -> Result<()> {
        self.outcome
            .await
            .map_err(|e| AppError::Internal(format!("Scoring job task failed: {}", e)))?
    }
}

/// Result of a cancel. `status` is authoritative for the caller right away;
/// `persisted` resolves once the background write finished (true on success).
pub struct CancelledJob {
    pub handle: JobHandle,
    pub status: StudyStatus,
    pub persisted: JoinHandle<bool>,
}

/// Owns study status: enacts every legal transition and the single
/// in-flight scoring job per study.
pub struct LifecycleController {
    store: Arc<dyn StudyStore>,
    scoring: Arc<dyn ScoringJobClient>,
    reputation: Arc<dyn ReputationProvider>,
    jobs: Arc<JobRegistry>,
    timeout: Duration,
    strict_review: bool,
}

impl LifecycleController {
    pub fn new(
        store: Arc<dyn StudyStore>,
        scoring: Arc<dyn ScoringJobClient>,
        reputation: Arc<dyn ReputationProvider>,
        config: &ScoringConfig,
    ) -> Self {
        Self {
            store,
            scoring,
            reputation,
            jobs: Arc::new(JobRegistry::new()),
            timeout: config.timeout,
            strict_review: config.strict_review,
        }
    }

    /// Draft -> Uploaded. Persists the study first when it has no id, then
    /// starts the reputation analysis in the background.
    pub async fn submit(&self, user: &AuthenticatedUser, study: Study) -> Result<Study> {
        authorize(StudyAction::Submit, Actor::User(user), &study.owner_uid)?;
        study.status.apply(StudyAction::Submit)?;

        let questionnaire = &study.document.questionnaire;
        if !questionnaire.has_full_participation() {
            return Err(AppError::Validation(format!(
                "Shareholder participation must total 100%, got {:.2}%",
                questionnaire.total_participation()
            )));
        }

        let id = match study.id {
            Some(id) => id,
            None => self
                .store
                .create(&study)
                .await?
                .id
                .ok_or_else(|| AppError::Internal("Store assigned no id".to_string()))?,
        };

        let submitted = self
            .transition(id, StudyAction::Submit, StudyPatch::status(StudyStatus::Uploaded))
            .await?;

        tracing::info!("Study {} submitted by {}", id, user.sub);
        self.run_reputation_analysis(id);

        Ok(submitted)
    }

    /// Draft/Uploaded -> Processing, then issue the external scoring call.
    ///
    /// `Processing` is persisted before the call goes out. The write is a
    /// compare-and-swap on the prior status, so of two concurrent starts only
    /// one succeeds.
    pub async fn start_scoring_job(
        &self,
        user: &AuthenticatedUser,
        study_id: Uuid,
    ) -> Result<StartedJob> {
        let study = self.store.get(study_id).await?;
        authorize(StudyAction::StartScoring, Actor::User(user), &study.owner_uid)?;

        let sources = StudyAction::StartScoring.sources();
        if !sources.contains(&study.status) {
            return Err(AppError::InvalidState(format!(
                "Scoring can only start from draft or uploaded; study is '{}'",
                study.status
            )));
        }

        let study = self
            .store
            .merge_if_status(
                study_id,
                sources,
                StudyPatch::status(StudyStatus::Processing),
            )
            .await?
            .ok_or_else(|| {
                AppError::InvalidState("Scoring was started concurrently for this study".to_string())
            })?;

        let (handle, signal) = self.jobs.register(study_id);
        let payload = scoring_payload(study_id, &study)?;

        tracing::info!(
            "Starting scoring job {} for study {} (requested by {})",
            handle.job_id,
            study_id,
            user.sub
        );

        let outcome = tokio::spawn(run_scoring_call(
            self.store.clone(),
            self.scoring.clone(),
            self.jobs.clone(),
            self.timeout,
            handle,
            signal,
            payload,
        ));

        Ok(StartedJob {
            handle,
            study,
            outcome,
        })
    }

    /// Handle of the job currently in flight for a study, if any
    pub fn active_job(&self, study_id: Uuid) -> Option<JobHandle> {
        self.jobs.active(study_id)
    }

    /// Invalidate the job's token, if it is still held, and report `Draft`
    /// immediately. Persisting `Draft` runs in the background; its failure is
    /// only logged. A handle superseded by a newer job is rejected.
    pub fn cancel_scoring_job(
        &self,
        user: &AuthenticatedUser,
        handle: JobHandle,
    ) -> Result<CancelledJob> {
        // Role-only check: cancelling must not wait on the store
        authorize(StudyAction::Reset, Actor::User(user), "")?;

        match self.jobs.cancel(&handle) {
            CancelOutcome::Cancelled => tracing::info!(
                "Scoring job {} for study {} cancelled by {}",
                handle.job_id,
                handle.study_id,
                user.sub
            ),
            CancelOutcome::NoActiveJob => tracing::info!(
                "Study {} has no active scoring job; reverting to draft for {}",
                handle.study_id,
                user.sub
            ),
            CancelOutcome::Superseded(active) => {
                return Err(AppError::InvalidState(format!(
                    "Job {} was superseded by job {}",
                    handle.job_id, active
                )));
            }
        }

        let store = self.store.clone();
        let persisted = tokio::spawn(async move {
            let result = store
                .merge_if_status(
                    handle.study_id,
                    &[StudyStatus::Processing],
                    StudyPatch::status(StudyStatus::Draft),
                )
                .await;

            match result {
                Ok(Some(_)) => true,
                Ok(None) => {
                    tracing::warn!(
                        "Study {} left processing before the cancellation was persisted",
                        handle.study_id
                    );
                    false
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to persist cancellation of study {}: {}",
                        handle.study_id,
                        e
                    );
                    false
                }
            }
        });

        Ok(CancelledJob {
            handle,
            status: StudyStatus::Draft,
            persisted,
        })
    }

    /// Processing -> Draft on request; drops any active job token
    pub async fn reset_study(&self, user: &AuthenticatedUser, study_id: Uuid) -> Result<Study> {
        let study = self.store.get(study_id).await?;
        authorize(StudyAction::Reset, Actor::User(user), &study.owner_uid)?;
        study.status.apply(StudyAction::Reset)?;

        if let Some(handle) = self.jobs.cancel_study(study_id) {
            tracing::info!("Reset of study {} cancelled job {}", study_id, handle.job_id);
        }

        let study = self
            .transition(study_id, StudyAction::Reset, StudyPatch::status(StudyStatus::Draft))
            .await?;

        tracing::info!("Study {} reset to draft by {}", study_id, user.sub);
        Ok(study)
    }

    pub async fn approve(&self, user: &AuthenticatedUser, study_id: Uuid) -> Result<Study> {
        self.decide(user, study_id, StudyAction::Approve).await
    }

    pub async fn reject(&self, user: &AuthenticatedUser, study_id: Uuid) -> Result<Study> {
        self.decide(user, study_id, StudyAction::Reject).await
    }

    /// Approve/reject. Unguarded writes unless strict review is enabled, in
    /// which case only PendingReview/Corrected studies can be decided.
    async fn decide(
        &self,
        user: &AuthenticatedUser,
        study_id: Uuid,
        action: StudyAction,
    ) -> Result<Study> {
        let study = self.store.get(study_id).await?;
        authorize(action, Actor::User(user), &study.owner_uid)?;

        let patch = StudyPatch::status(action.target());
        let study = if self.strict_review {
            study.status.apply(action)?;
            self.transition(study_id, action, patch).await?
        } else {
            self.store.merge(study_id, patch).await?
        };

        tracing::info!("Study {} marked {} by {}", study_id, study.status, user.sub);
        Ok(study)
    }

    /// Processing -> PendingReview, reported by the scoring job with its result
    pub async fn complete_scoring(&self, study_id: Uuid, analysis: AnalysisData) -> Result<Study> {
        let study = self.store.get(study_id).await?;
        authorize(
            StudyAction::CompleteScoring,
            Actor::ScoringService,
            &study.owner_uid,
        )?;
        study.status.apply(StudyAction::CompleteScoring)?;

        let analysis = serde_json::to_value(analysis)
            .map_err(|e| AppError::Internal(format!("Failed to encode analysis: {}", e)))?;
        let path = FieldPath::parse("analysisData").map_err(AppError::Internal)?;
        let patch = StudyPatch::status(StudyStatus::PendingReview).set(path, analysis);

        let study = self
            .transition(study_id, StudyAction::CompleteScoring, patch)
            .await?;

        tracing::info!("Scoring completed for study {}", study_id);
        Ok(study)
    }

    /// Merge a reputation analysis into the study in the background. Failures
    /// are logged; the study simply stays without `reputationData`.
    pub fn run_reputation_analysis(&self, study_id: Uuid) -> JoinHandle<()> {
        let store = self.store.clone();
        let provider = self.reputation.clone();

        tokio::spawn(async move {
            let result: Result<()> = async {
                let study = store.get(study_id).await?;
                let reputation = provider.analyze(&study).await?;
                let value = serde_json::to_value(reputation)
                    .map_err(|e| AppError::Internal(e.to_string()))?;
                let path = FieldPath::parse("reputationData").map_err(AppError::Internal)?;
                store
                    .merge(study_id, StudyPatch::default().set(path, value))
                    .await?;
                Ok::<(), AppError>(())
            }
            .await;

            match result {
                Ok(()) => tracing::info!("Reputation analysis stored for study {}", study_id),
                Err(e) => tracing::warn!("Reputation analysis for study {} failed: {}", study_id, e),
            }
        })
    }

    /// Guarded status write for `action`; a status that moved on since it
    /// was checked is reported as an invalid transition from the fresh status.
    async fn transition(
        &self,
        study_id: Uuid,
        action: StudyAction,
        patch: StudyPatch,
    ) -> Result<Study> {
        match self
            .store
            .merge_if_status(study_id, action.sources(), patch)
            .await?
        {
            Some(study) => Ok(study),
            None => {
                let current = self.store.get(study_id).await?;
                Err(InvalidTransition {
                    from: current.status,
                    action,
                }
                .into())
            }
        }
    }
}

fn scoring_payload(study_id: Uuid, study: &Study) -> Result<ScoringJobPayload> {
    let questionnaire = serde_json::to_value(&study.document.questionnaire)
        .map_err(|e| AppError::Internal(format!("Failed to encode questionnaire: {}", e)))?;

    Ok(ScoringJobPayload {
        app_id: study_id,
        timestamp: Utc::now().timestamp_millis(),
        empresa: study.document.empresa_nombre.clone(),
        rfc: study.document.rfc.clone(),
        files: study.document.files.clone(),
        questionnaire,
    })
}

enum CallEnd {
    Cancelled,
    TimedOut,
    Resolved(std::result::Result<(), crate::modules::scoring::ScoringCallError>),
}

/// Race the external call against its cancel signal and the timeout.
async fn run_scoring_call(
    store: Arc<dyn StudyStore>,
    scoring: Arc<dyn ScoringJobClient>,
    jobs: Arc<JobRegistry>,
    timeout: Duration,
    handle: JobHandle,
    signal: CancelSignal,
    payload: ScoringJobPayload,
) -> Result<()> {
    let study_id = handle.study_id;

    let end = tokio::select! {
        _ = signal.cancelled() => CallEnd::Cancelled,
        result = tokio::time::timeout(timeout, scoring.submit(&payload)) => match result {
            Ok(resolved) => CallEnd::Resolved(resolved),
            Err(_) => CallEnd::TimedOut,
        },
    };

    match end {
        CallEnd::Cancelled => {
            tracing::info!("Scoring job {} for study {} stopped", handle.job_id, study_id);
            Err(AppError::ExternalCallCancelled(
                "Scoring job was cancelled".to_string(),
            ))
        }
        CallEnd::TimedOut => {
            // The job may still be running remotely; status stays Processing
            jobs.finish(&handle);
            tracing::warn!(
                "Scoring job {} for study {} not acknowledged within {}s",
                handle.job_id,
                study_id,
                timeout.as_secs()
            );
            Err(AppError::ExternalCallCancelled(format!(
                "Scoring job not acknowledged within {}s; it may still complete",
                timeout.as_secs()
            )))
        }
        CallEnd::Resolved(result) => {
            if !jobs.finish(&handle) {
                tracing::debug!(
                    "Discarding late result of job {} for study {}",
                    handle.job_id,
                    study_id
                );
                return Err(AppError::ExternalCallCancelled(
                    "Scoring job was cancelled; its result was discarded".to_string(),
                ));
            }

            match result {
                Ok(()) => {
                    tracing::info!("Scoring job {} acknowledged for study {}", handle.job_id, study_id);
                    Ok(())
                }
                Err(e) => {
                    roll_back(store.as_ref(), study_id).await;
                    Err(AppError::ExternalCallFailed(e.to_string()))
                }
            }
        }
    }
}

/// Failed job: back to Draft, but only if nobody moved the study on
async fn roll_back(store: &dyn StudyStore, study_id: Uuid) {
    if let Err(e) = authorize(StudyAction::Reset, Actor::Controller, "") {
        tracing::error!("Rollback of study {} not permitted: {}", study_id, e);
        return;
    }

    let result = store
        .merge_if_status(
            study_id,
            StudyAction::Reset.sources(),
            StudyPatch::status(StudyAction::Reset.target()),
        )
        .await;

    match result {
        Ok(Some(_)) => tracing::info!("Study {} rolled back to draft after failed job", study_id),
        Ok(None) => tracing::info!("Study {} no longer processing; no rollback", study_id),
        Err(e) => tracing::error!("Failed to roll back study {}: {}", study_id, e),
    }
}
