use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::watch;
use utoipa::ToSchema;
use uuid::Uuid;

/// Identifies one scoring job of one study. Required to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobHandle {
    pub study_id: Uuid,
    pub job_id: Uuid,
}

struct ActiveJob {
    job_id: Uuid,
    cancel: watch::Sender<bool>,
}

/// Cancellation side of a job, held by the task waiting on the external call
pub struct CancelSignal(watch::Receiver<bool>);

impl CancelSignal {
    /// Resolves once the job is cancelled. A job whose token was replaced
    /// without an explicit cancel is never signalled.
    pub async fn cancelled(mut self) {
        if self.0.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// What `JobRegistry::cancel` found for a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The handle's token was active and is now invalidated
    Cancelled,
    /// No token is held for the study (finished, timed out or reset)
    NoActiveJob,
    /// A newer job holds the study's token; it was left running
    Superseded(Uuid),
}

/// At most one active job token per study
#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<Uuid, ActiveJob>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn jobs(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, ActiveJob>> {
        // The map stays consistent even if a holder panicked
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Issue a fresh token for `study_id`, discarding any stale one
    pub fn register(&self, study_id: Uuid) -> (JobHandle, CancelSignal) {
        let (cancel, signal) = watch::channel(false);
        let job_id = Uuid::now_v7();

        if let Some(stale) = self.jobs().insert(study_id, ActiveJob { job_id, cancel }) {
            tracing::debug!(
                "Discarded stale job {} for study {}",
                stale.job_id,
                study_id
            );
        }

        (JobHandle { study_id, job_id }, CancelSignal(signal))
    }

    pub fn active(&self, study_id: Uuid) -> Option<JobHandle> {
        self.jobs().get(&study_id).map(|job| JobHandle {
            study_id,
            job_id: job.job_id,
        })
    }

    /// Cancel the job named by `handle` if it is still the active one
    pub fn cancel(&self, handle: &JobHandle) -> CancelOutcome {
        let mut jobs = self.jobs();
        match jobs.get(&handle.study_id) {
            Some(job) if job.job_id == handle.job_id => {
                if let Some(job) = jobs.remove(&handle.study_id) {
                    let _ = job.cancel.send(true);
                }
                CancelOutcome::Cancelled
            }
            Some(job) => CancelOutcome::Superseded(job.job_id),
            None => CancelOutcome::NoActiveJob,
        }
    }

    /// Cancel whatever job is active for `study_id`
    pub fn cancel_study(&self, study_id: Uuid) -> Option<JobHandle> {
        let job = self.jobs().remove(&study_id)?;
        let _ = job.cancel.send(true);
        Some(JobHandle {
            study_id,
            job_id: job.job_id,
        })
    }

    /// Release the token once its call resolved. Returns false when the
    /// token was invalidated meanwhile and the result must be ignored.
    pub fn finish(&self, handle: &JobHandle) -> bool {
        let mut jobs = self.jobs();
        match jobs.get(&handle.study_id) {
            Some(job) if job.job_id == handle.job_id => {
                jobs.remove(&handle.study_id);
                true
            }
            _ => false,
        }
    }
}
