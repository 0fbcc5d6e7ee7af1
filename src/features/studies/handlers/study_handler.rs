use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::studies::dtos::{CreateStudyDto, ListStudiesQuery, ReportSummaryDto};
use crate::features::studies::models::{Questionnaire, Study};
use crate::features::studies::services::{ReportService, StudyService};
use crate::shared::types::ApiResponse;

/// State for study intake handlers
#[derive(Clone)]
pub struct StudyState {
    pub studies: Arc<StudyService>,
    pub reports: Arc<ReportService>,
}

/// List studies visible to the caller, newest first
#[utoipa::path(
    get,
    path = "/api/studies",
    params(ListStudiesQuery),
    responses(
        (status = 200, description = "Studies visible to the caller", body = ApiResponse<Vec<Study>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "studies",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_studies(
    user: AuthenticatedUser,
    State(state): State<StudyState>,
    Query(params): Query<ListStudiesQuery>,
) -> Result<Json<ApiResponse<Vec<Study>>>> {
    let studies = state.studies.list(&user, params.search.as_deref()).await?;
    Ok(Json(ApiResponse::<Study>::list(studies)))
}

/// Create a draft study owned by the caller
#[utoipa::path(
    post,
    path = "/api/studies",
    request_body = CreateStudyDto,
    responses(
        (status = 201, description = "Study created", body = ApiResponse<Study>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "studies",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_study(
    user: AuthenticatedUser,
    State(state): State<StudyState>,
    AppJson(dto): AppJson<CreateStudyDto>,
) -> Result<(StatusCode, Json<ApiResponse<Study>>)> {
    let study = state.studies.create(&user, dto.questionnaire).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(study),
            Some("Study created".to_string()),
            None,
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/studies/{id}",
    params(
        ("id" = Uuid, Path, description = "Study ID")
    ),
    responses(
        (status = 200, description = "Study", body = ApiResponse<Study>),
        (status = 403, description = "Study belongs to another requester"),
        (status = 404, description = "Study not found")
    ),
    tag = "studies",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_study(
    user: AuthenticatedUser,
    State(state): State<StudyState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Study>>> {
    let study = state.studies.get(&user, id).await?;
    Ok(Json(ApiResponse::success(Some(study), None, None)))
}

/// Replace the questionnaire of a study
#[utoipa::path(
    put,
    path = "/api/studies/{id}/questionnaire",
    params(
        ("id" = Uuid, Path, description = "Study ID")
    ),
    request_body = Questionnaire,
    responses(
        (status = 200, description = "Questionnaire saved", body = ApiResponse<Study>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Study belongs to another requester"),
        (status = 404, description = "Study not found")
    ),
    tag = "studies",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn save_questionnaire(
    user: AuthenticatedUser,
    State(state): State<StudyState>,
    Path(id): Path<Uuid>,
    AppJson(questionnaire): AppJson<Questionnaire>,
) -> Result<Json<ApiResponse<Study>>> {
    let study = state
        .studies
        .save_questionnaire(&user, id, questionnaire)
        .await?;
    Ok(Json(ApiResponse::success(
        Some(study),
        Some("Questionnaire saved".to_string()),
        None,
    )))
}

/// Executive summary of a scored study
#[utoipa::path(
    get,
    path = "/api/studies/{id}/report",
    params(
        ("id" = Uuid, Path, description = "Study ID")
    ),
    responses(
        (status = 200, description = "Report summary", body = ApiResponse<ReportSummaryDto>),
        (status = 404, description = "Study not found"),
        (status = 409, description = "Study has not been scored yet")
    ),
    tag = "studies",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn report_summary(
    user: AuthenticatedUser,
    State(state): State<StudyState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReportSummaryDto>>> {
    let summary = state.reports.summary(&user, id).await?;
    Ok(Json(ApiResponse::success(Some(summary), None, None)))
}
