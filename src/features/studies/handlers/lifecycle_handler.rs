use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::guards::RequireReviewer;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::studies::dtos::{CancelScoringDto, ScoringJobDto};
use crate::features::studies::lifecycle::{JobHandle, LifecycleController};
use crate::features::studies::models::{Study, StudyStatus};
use crate::features::studies::services::StudyService;
use crate::shared::types::ApiResponse;

/// State for lifecycle handlers
#[derive(Clone)]
pub struct LifecycleState {
    pub studies: Arc<StudyService>,
    pub lifecycle: Arc<LifecycleController>,
}

fn study_response(study: Study, message: &str) -> Json<ApiResponse<Study>> {
    Json(ApiResponse::success(
        Some(study),
        Some(message.to_string()),
        None,
    ))
}

/// Submit a draft study for review
#[utoipa::path(
    post,
    path = "/api/studies/{id}/submit",
    params(
        ("id" = Uuid, Path, description = "Study ID")
    ),
    responses(
        (status = 200, description = "Study submitted", body = ApiResponse<Study>),
        (status = 400, description = "Shareholder participation does not total 100%"),
        (status = 403, description = "Only the owner can submit"),
        (status = 409, description = "Study is not a draft")
    ),
    tag = "lifecycle",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn submit_study(
    user: AuthenticatedUser,
    State(state): State<LifecycleState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Study>>> {
    let study = state.studies.get(&user, id).await?;
    let study = state.lifecycle.submit(&user, study).await?;
    Ok(study_response(study, "Study submitted"))
}

/// Start the external scoring job and wait for its acknowledgement.
///
/// Answers 202 when the wait ended before an acknowledgement (timeout or
/// cancellation); the job may still complete remotely.
#[utoipa::path(
    post,
    path = "/api/studies/{id}/scoring",
    params(
        ("id" = Uuid, Path, description = "Study ID")
    ),
    responses(
        (status = 200, description = "Scoring job acknowledged", body = ApiResponse<ScoringJobDto>),
        (status = 202, description = "Wait ended before acknowledgement", body = ApiResponse<ScoringJobDto>),
        (status = 403, description = "Reviewer access required"),
        (status = 409, description = "Study cannot start scoring from its status"),
        (status = 502, description = "Scoring job failed; study rolled back to draft")
    ),
    tag = "lifecycle",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn start_scoring(
    RequireReviewer(user): RequireReviewer,
    State(state): State<LifecycleState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<ScoringJobDto>>)> {
    let job = state.lifecycle.start_scoring_job(&user, id).await?;
    let handle = job.handle;
    let status = job.study.status;

    match job.outcome().await {
        Ok(()) => Ok((
            StatusCode::OK,
            Json(ApiResponse::success(
                Some(ScoringJobDto::new(handle, status)),
                Some("Scoring job acknowledged".to_string()),
                None,
            )),
        )),
        Err(AppError::ExternalCallCancelled(msg)) => Ok((
            StatusCode::ACCEPTED,
            Json(ApiResponse::success(
                Some(ScoringJobDto::new(handle, status)),
                Some(msg),
                None,
            )),
        )),
        Err(e) => Err(e),
    }
}

/// The scoring job currently in flight, if any
#[utoipa::path(
    get,
    path = "/api/studies/{id}/scoring",
    params(
        ("id" = Uuid, Path, description = "Study ID")
    ),
    responses(
        (status = 200, description = "Active job, or null", body = ApiResponse<ScoringJobDto>),
        (status = 403, description = "Study belongs to another requester"),
        (status = 404, description = "Study not found")
    ),
    tag = "lifecycle",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn active_job(
    user: AuthenticatedUser,
    State(state): State<LifecycleState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ScoringJobDto>>> {
    let study = state.studies.get(&user, id).await?;
    let job = state
        .lifecycle
        .active_job(id)
        .map(|handle| ScoringJobDto::new(handle, study.status));
    Ok(Json(ApiResponse::success(job, None, None)))
}

/// Cancel an in-flight scoring job. The study is reported as draft at once;
/// the write happens in the background.
#[utoipa::path(
    delete,
    path = "/api/studies/{id}/scoring/{job_id}",
    params(
        ("id" = Uuid, Path, description = "Study ID"),
        ("job_id" = Uuid, Path, description = "Job ID returned when scoring started")
    ),
    responses(
        (status = 200, description = "Job cancelled", body = ApiResponse<CancelScoringDto>),
        (status = 403, description = "Reviewer access required"),
        (status = 409, description = "Handle superseded by a newer job")
    ),
    tag = "lifecycle",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn cancel_scoring(
    RequireReviewer(user): RequireReviewer,
    State(state): State<LifecycleState>,
    Path((id, job_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<CancelScoringDto>>> {
    let handle = JobHandle {
        study_id: id,
        job_id,
    };
    let cancelled = state.lifecycle.cancel_scoring_job(&user, handle)?;

    Ok(Json(ApiResponse::success(
        Some(CancelScoringDto {
            study_id: cancelled.handle.study_id,
            job_id: cancelled.handle.job_id,
            status: cancelled.status,
        }),
        Some("Scoring job cancelled".to_string()),
        None,
    )))
}

/// Return a processing study to draft
#[utoipa::path(
    post,
    path = "/api/studies/{id}/reset",
    params(
        ("id" = Uuid, Path, description = "Study ID")
    ),
    responses(
        (status = 200, description = "Study reset to draft", body = ApiResponse<Study>),
        (status = 403, description = "Reviewer access required"),
        (status = 409, description = "Study is not processing")
    ),
    tag = "lifecycle",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn reset_study(
    RequireReviewer(user): RequireReviewer,
    State(state): State<LifecycleState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Study>>> {
    let study = state.lifecycle.reset_study(&user, id).await?;
    Ok(study_response(study, "Study reset to draft"))
}

#[utoipa::path(
    post,
    path = "/api/studies/{id}/approve",
    params(
        ("id" = Uuid, Path, description = "Study ID")
    ),
    responses(
        (status = 200, description = "Study approved", body = ApiResponse<Study>),
        (status = 403, description = "Reviewer access required"),
        (status = 409, description = "Study is not awaiting review (strict review only)")
    ),
    tag = "lifecycle",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn approve_study(
    RequireReviewer(user): RequireReviewer,
    State(state): State<LifecycleState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Study>>> {
    let study = state.lifecycle.approve(&user, id).await?;
    Ok(study_response(study, "Study approved"))
}

#[utoipa::path(
    post,
    path = "/api/studies/{id}/reject",
    params(
        ("id" = Uuid, Path, description = "Study ID")
    ),
    responses(
        (status = 200, description = "Study rejected", body = ApiResponse<Study>),
        (status = 403, description = "Reviewer access required"),
        (status = 409, description = "Study is not awaiting review (strict review only)")
    ),
    tag = "lifecycle",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn reject_study(
    RequireReviewer(user): RequireReviewer,
    State(state): State<LifecycleState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Study>>> {
    let study = state.lifecycle.reject(&user, id).await?;
    Ok(study_response(study, "Study rejected"))
}

/// Start a reputation analysis in the background
#[utoipa::path(
    post,
    path = "/api/studies/{id}/reputation",
    params(
        ("id" = Uuid, Path, description = "Study ID")
    ),
    responses(
        (status = 202, description = "Reputation analysis started"),
        (status = 403, description = "Study belongs to another requester"),
        (status = 404, description = "Study not found")
    ),
    tag = "lifecycle",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn request_reputation(
    user: AuthenticatedUser,
    State(state): State<LifecycleState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<StudyStatus>>)> {
    let study = state.studies.get(&user, id).await?;
    state.lifecycle.run_reputation_analysis(id);

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::success(
            Some(study.status),
            Some("Reputation analysis started".to_string()),
            None,
        )),
    ))
}
